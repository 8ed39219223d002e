use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use vinylbase_core::{
    log_error, log_warn, set_log_level, Backend, Collection, Delta, Filter, LogLevel, RecordId,
    StoreClient,
};

/// Deadline shared by the whole driver run
const RUN_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Parser)]
#[command(name = "vinylbase")]
#[command(about = "VinylBase driver - exercises the document store end to end")]
#[command(version)]
struct Cli {
    /// Store URI (mem:// or file://<path>)
    #[arg(long, default_value = "file://vinylbase.vlite")]
    uri: String,
    /// Database name
    #[arg(long, default_value = "mydb")]
    database: String,
    /// Collection name
    #[arg(long, default_value = "albums")]
    collection: String,
    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Album {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<RecordId>,
    artist: String,
    #[serde(rename = "album")]
    title: String,
    year: i64,
}

impl Album {
    fn new(artist: &str, title: &str, year: i64) -> Self {
        Album {
            id: None,
            artist: artist.to_string(),
            title: title.to_string(),
            year,
        }
    }
}

impl fmt::Display for Album {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "[{}] {} - {} ({})", id, self.artist, self.title, self.year),
            None => write!(f, "{} - {} ({})", self.artist, self.title, self.year),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    if let Some(level) = LogLevel::parse(&cli.log_level) {
        set_log_level(level);
    }

    // Connect and ping failures are fatal; everything after is not
    let client = StoreClient::connect(&cli.uri, RUN_TIMEOUT)
        .with_context(|| format!("Failed to connect to {}", cli.uri))?;
    client
        .ping()
        .with_context(|| format!("Store at {} did not answer the ping", cli.uri))?;

    let albums = client
        .database(&cli.database)
        .collection::<Album>(&cli.collection);
    run_demo(&albums);

    Ok(())
}

fn run_demo(albums: &Collection<Album, Backend>) {
    // Create
    let zeit = Album::new("Rammstein", "Zeit", 2022);
    match albums.insert_one(&zeit) {
        Ok(id) => println!("assigned id {} for {}", id, zeit),
        Err(e) => log_error!("could not insert {}: {}", zeit, e),
    }

    let batch = vec![
        Album::new("Queen", "A Day at the Races", 1976),
        Album::new("Beethoven", "9. Symphonie", 1824),
    ];
    match albums.insert_many(&batch) {
        Ok(result) => {
            for (id, album) in result.inserted_ids.iter().zip(&batch) {
                println!("assigned id {} for {}", id, album);
            }
        }
        Err(e) => log_error!("could not insert batch of {} albums: {}", batch.len(), e),
    }

    // Read
    let modern = Filter::and(vec![Filter::gt("year", 1950)]);
    println!();
    println!("albums released after 1950:");
    for album in find_all(albums, &modern) {
        println!("{}", album);
    }

    match albums.find_one(&modern) {
        Ok(Some(album)) => println!("first match: {}", album),
        Ok(None) => println!("no album released after 1950"),
        Err(e) => log_error!("could not read first match: {}", e),
    }

    println!();
    println!("full catalog:");
    for album in find_all(albums, &Filter::all()) {
        println!("{}", album);
    }

    // Update
    let misspelled = Album::new("ramstein", "Rammstein", 2019);
    match albums.insert_one(&misspelled) {
        Ok(id) => {
            let delta = Delta::new().set("artist", "Rammstein").inc("year", 1);
            match albums.update_by_id(&id, &delta) {
                Ok(modified) => println!("{} documents were updated", modified),
                Err(e) => log_error!("could not update record {}: {}", id, e),
            }
        }
        Err(e) => log_error!("could not insert {}: {}", misspelled, e),
    }

    // Delete
    match albums.delete_many(&Filter::lt("year", 1950)) {
        Ok(deleted) => println!("{} documents were deleted", deleted),
        Err(e) => log_error!("could not delete albums released before 1950: {}", e),
    }

    println!();
    println!("remaining catalog:");
    for album in find_all(albums, &Filter::all()) {
        println!("{}", album);
    }

    if let Err(e) = albums.drop() {
        log_error!("could not drop {}: {}", albums.namespace(), e);
    }
}

/// Read every match; a failed read is logged and whatever could be read is
/// returned in its place
fn find_all(albums: &Collection<Album, Backend>, filter: &Filter) -> Vec<Album> {
    let cursor = match albums.find(filter) {
        Ok(cursor) => cursor,
        Err(e) => {
            log_error!("could not read from store: {}", e);
            return Vec::new();
        }
    };

    let mut result = Vec::new();
    for album in cursor {
        match album {
            Ok(album) => result.push(album),
            Err(e) => log_warn!("skipping unreadable record: {}", e),
        }
    }
    result
}
