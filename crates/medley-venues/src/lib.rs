//! Venue, artist, and show records for the venues backend.
//!
//! Venues host shows, artists play them. All queries are plain functions
//! over a `rusqlite::Connection`; the HTTP layer owns pooling and
//! threading. Genre lists persist as JSON arrays in TEXT columns, and
//! show times are RFC 3339 UTC strings, so past/upcoming partitions are
//! plain lexical comparisons against a caller-supplied `now`.

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during listing operations.
#[derive(Debug, Error)]
pub enum ListingError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("venue not found: {0}")]
    VenueNotFound(i64),
    #[error("artist not found: {0}")]
    ArtistNotFound(i64),
    #[error("json serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A venue that hosts shows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Venue {
    /// Internal database ID.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Musical genres the venue books.
    pub genres: Vec<String>,
    pub city: String,
    pub state: String,
    pub address: String,
    pub phone: Option<String>,
    pub image_link: Option<String>,
    pub facebook_link: Option<String>,
    pub website: Option<String>,
    /// Whether the venue is currently looking for performers.
    pub seeking_talent: bool,
    pub seeking_description: Option<String>,
}

/// A performing artist.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Artist {
    /// Internal database ID.
    pub id: i64,
    /// Display name.
    pub name: String,
    pub genres: Vec<String>,
    pub city: String,
    pub state: String,
    pub phone: Option<String>,
    pub image_link: Option<String>,
    pub facebook_link: Option<String>,
    pub website: Option<String>,
    /// Whether the artist is currently looking for venues to play.
    pub seeking_venue: bool,
    pub seeking_description: Option<String>,
}

/// A booked show: one artist at one venue at one time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Show {
    pub id: i64,
    pub artist_id: i64,
    pub venue_id: i64,
    /// Start time (RFC 3339 UTC).
    pub start_time: String,
}

/// Parameters for creating a new venue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewVenue {
    pub name: String,
    pub genres: Vec<String>,
    pub city: String,
    pub state: String,
    pub address: String,
    pub phone: Option<String>,
    pub image_link: Option<String>,
    pub facebook_link: Option<String>,
    pub website: Option<String>,
    pub seeking_talent: bool,
    pub seeking_description: Option<String>,
}

/// Parameters for updating an existing venue.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VenueUpdate {
    pub name: Option<String>,
    pub genres: Option<Vec<String>>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub image_link: Option<String>,
    pub facebook_link: Option<String>,
    pub website: Option<String>,
    pub seeking_talent: Option<bool>,
    pub seeking_description: Option<String>,
}

/// Parameters for creating a new artist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewArtist {
    pub name: String,
    pub genres: Vec<String>,
    pub city: String,
    pub state: String,
    pub phone: Option<String>,
    pub image_link: Option<String>,
    pub facebook_link: Option<String>,
    pub website: Option<String>,
    pub seeking_venue: bool,
    pub seeking_description: Option<String>,
}

/// Parameters for updating an existing artist.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ArtistUpdate {
    pub name: Option<String>,
    pub genres: Option<Vec<String>>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub phone: Option<String>,
    pub image_link: Option<String>,
    pub facebook_link: Option<String>,
    pub website: Option<String>,
    pub seeking_venue: Option<bool>,
    pub seeking_description: Option<String>,
}

/// Parameters for creating a new show.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewShow {
    pub artist_id: i64,
    pub venue_id: i64,
    /// Start time (RFC 3339 UTC).
    pub start_time: String,
}

/// A venue or artist row in a listing or search result, with the count of
/// shows still to come.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListingSummary {
    pub id: i64,
    pub name: String,
    pub num_upcoming_shows: i64,
}

/// Venues in one locality, for the grouped listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CityGroup {
    pub city: String,
    pub state: String,
    pub venues: Vec<ListingSummary>,
}

/// A show as it appears on a venue's detail page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VenueShow {
    pub artist_id: i64,
    pub artist_name: String,
    pub artist_image_link: Option<String>,
    pub start_time: String,
}

/// A show as it appears on an artist's detail page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArtistShow {
    pub venue_id: i64,
    pub venue_name: String,
    pub venue_image_link: Option<String>,
    pub start_time: String,
}

/// A show in the full listing, joined with both parties.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShowListing {
    pub venue_id: i64,
    pub venue_name: String,
    pub artist_id: i64,
    pub artist_name: String,
    pub artist_image_link: Option<String>,
    pub start_time: String,
}

/// Past and upcoming shows for one venue or artist, split around `now`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShowPartition<T> {
    pub past: Vec<T>,
    pub upcoming: Vec<T>,
}

// --- Venues ---

/// Creates a new venue, returning its assigned ID.
pub fn create_venue(conn: &Connection, venue: &NewVenue) -> Result<i64, ListingError> {
    let genres_json = serde_json::to_string(&venue.genres)?;
    conn.execute(
        "INSERT INTO venues (
            name, genres, city, state, address, phone,
            image_link, facebook_link, website, seeking_talent, seeking_description
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            venue.name,
            genres_json,
            venue.city,
            venue.state,
            venue.address,
            venue.phone,
            venue.image_link,
            venue.facebook_link,
            venue.website,
            venue.seeking_talent,
            venue.seeking_description,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Retrieves a venue by ID.
pub fn get_venue(conn: &Connection, id: i64) -> Result<Venue, ListingError> {
    conn.query_row(
        "SELECT id, name, genres, city, state, address, phone,
                image_link, facebook_link, website, seeking_talent, seeking_description
         FROM venues WHERE id = ?1",
        [id],
        map_row_to_venue,
    )
    .optional()?
    .ok_or(ListingError::VenueNotFound(id))
}

/// Updates an existing venue using a single atomic UPDATE statement.
///
/// Only fields that are `Some` in `updates` are modified; `None` fields
/// are left untouched.
pub fn update_venue(
    conn: &Connection,
    id: i64,
    updates: &VenueUpdate,
) -> Result<(), ListingError> {
    let mut builder = UpdateBuilder::new();

    if let Some(name) = &updates.name {
        builder.set("name", Box::new(name.clone()));
    }
    if let Some(genres) = &updates.genres {
        let json = serde_json::to_string(genres)?;
        builder.set("genres", Box::new(json));
    }
    if let Some(city) = &updates.city {
        builder.set("city", Box::new(city.clone()));
    }
    if let Some(state) = &updates.state {
        builder.set("state", Box::new(state.clone()));
    }
    if let Some(address) = &updates.address {
        builder.set("address", Box::new(address.clone()));
    }
    if let Some(phone) = &updates.phone {
        builder.set("phone", Box::new(phone.clone()));
    }
    if let Some(link) = &updates.image_link {
        builder.set("image_link", Box::new(link.clone()));
    }
    if let Some(link) = &updates.facebook_link {
        builder.set("facebook_link", Box::new(link.clone()));
    }
    if let Some(site) = &updates.website {
        builder.set("website", Box::new(site.clone()));
    }
    if let Some(seeking) = &updates.seeking_talent {
        builder.set("seeking_talent", Box::new(*seeking));
    }
    if let Some(desc) = &updates.seeking_description {
        builder.set("seeking_description", Box::new(desc.clone()));
    }

    if builder.is_empty() {
        // No fields to update; verify the venue exists.
        let _ = get_venue(conn, id)?;
        return Ok(());
    }

    let count = builder.execute(conn, "venues", id)?;
    if count == 0 {
        return Err(ListingError::VenueNotFound(id));
    }
    Ok(())
}

/// Deletes a venue. Its shows are removed by FK cascade.
pub fn delete_venue(conn: &Connection, id: i64) -> Result<(), ListingError> {
    let count = conn.execute("DELETE FROM venues WHERE id = ?1", [id])?;
    if count == 0 {
        return Err(ListingError::VenueNotFound(id));
    }
    Ok(())
}

/// Lists all venues grouped by (city, state), each with its count of
/// upcoming shows relative to `now`.
pub fn list_venues_grouped(conn: &Connection, now: &str) -> Result<Vec<CityGroup>, ListingError> {
    let mut stmt = conn.prepare(
        "SELECT v.id, v.name, v.city, v.state,
                (SELECT COUNT(*) FROM shows s WHERE s.venue_id = v.id AND s.start_time > ?1)
         FROM venues v
         ORDER BY v.city ASC, v.state ASC, v.name ASC",
    )?;

    let rows = stmt.query_map([now], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, i64>(4)?,
        ))
    })?;

    let mut groups: Vec<CityGroup> = Vec::new();
    for row in rows {
        let (id, name, city, state, num_upcoming_shows) = row?;
        let summary = ListingSummary {
            id,
            name,
            num_upcoming_shows,
        };
        match groups
            .last_mut()
            .filter(|g| g.city == city && g.state == state)
        {
            Some(group) => group.venues.push(summary),
            None => groups.push(CityGroup {
                city,
                state,
                venues: vec![summary],
            }),
        }
    }
    Ok(groups)
}

/// Case-insensitive substring search on venue names.
pub fn search_venues(
    conn: &Connection,
    term: &str,
    now: &str,
) -> Result<Vec<ListingSummary>, ListingError> {
    let pattern = like_pattern(term);
    let mut stmt = conn.prepare(
        "SELECT v.id, v.name,
                (SELECT COUNT(*) FROM shows s WHERE s.venue_id = v.id AND s.start_time > ?2)
         FROM venues v
         WHERE v.name LIKE ?1 ESCAPE '\\'
         ORDER BY v.name ASC",
    )?;

    let rows = stmt.query_map(params![pattern, now], map_row_to_summary)?;
    collect(rows)
}

/// Past and upcoming shows at a venue, relative to `now`.
///
/// Errors with `VenueNotFound` if the venue does not exist.
pub fn venue_shows(
    conn: &Connection,
    venue_id: i64,
    now: &str,
) -> Result<ShowPartition<VenueShow>, ListingError> {
    // Verify the venue exists first so a missing venue is a 404 rather
    // than an empty partition.
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM venues WHERE id = ?1)",
        [venue_id],
        |row| row.get(0),
    )?;
    if !exists {
        return Err(ListingError::VenueNotFound(venue_id));
    }

    let mut stmt = conn.prepare(
        "SELECT s.artist_id, a.name, a.image_link, s.start_time
         FROM shows s JOIN artists a ON a.id = s.artist_id
         WHERE s.venue_id = ?1
         ORDER BY s.start_time ASC",
    )?;

    let rows = stmt.query_map([venue_id], |row| {
        Ok(VenueShow {
            artist_id: row.get(0)?,
            artist_name: row.get(1)?,
            artist_image_link: row.get(2)?,
            start_time: row.get(3)?,
        })
    })?;

    let mut partition = ShowPartition {
        past: Vec::new(),
        upcoming: Vec::new(),
    };
    for row in rows {
        let show = row?;
        if show.start_time.as_str() > now {
            partition.upcoming.push(show);
        } else {
            partition.past.push(show);
        }
    }
    Ok(partition)
}

// --- Artists ---

/// Creates a new artist, returning its assigned ID.
pub fn create_artist(conn: &Connection, artist: &NewArtist) -> Result<i64, ListingError> {
    let genres_json = serde_json::to_string(&artist.genres)?;
    conn.execute(
        "INSERT INTO artists (
            name, genres, city, state, phone,
            image_link, facebook_link, website, seeking_venue, seeking_description
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            artist.name,
            genres_json,
            artist.city,
            artist.state,
            artist.phone,
            artist.image_link,
            artist.facebook_link,
            artist.website,
            artist.seeking_venue,
            artist.seeking_description,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Retrieves an artist by ID.
pub fn get_artist(conn: &Connection, id: i64) -> Result<Artist, ListingError> {
    conn.query_row(
        "SELECT id, name, genres, city, state, phone,
                image_link, facebook_link, website, seeking_venue, seeking_description
         FROM artists WHERE id = ?1",
        [id],
        map_row_to_artist,
    )
    .optional()?
    .ok_or(ListingError::ArtistNotFound(id))
}

/// Updates an existing artist. Same single-statement contract as
/// [`update_venue`].
pub fn update_artist(
    conn: &Connection,
    id: i64,
    updates: &ArtistUpdate,
) -> Result<(), ListingError> {
    let mut builder = UpdateBuilder::new();

    if let Some(name) = &updates.name {
        builder.set("name", Box::new(name.clone()));
    }
    if let Some(genres) = &updates.genres {
        let json = serde_json::to_string(genres)?;
        builder.set("genres", Box::new(json));
    }
    if let Some(city) = &updates.city {
        builder.set("city", Box::new(city.clone()));
    }
    if let Some(state) = &updates.state {
        builder.set("state", Box::new(state.clone()));
    }
    if let Some(phone) = &updates.phone {
        builder.set("phone", Box::new(phone.clone()));
    }
    if let Some(link) = &updates.image_link {
        builder.set("image_link", Box::new(link.clone()));
    }
    if let Some(link) = &updates.facebook_link {
        builder.set("facebook_link", Box::new(link.clone()));
    }
    if let Some(site) = &updates.website {
        builder.set("website", Box::new(site.clone()));
    }
    if let Some(seeking) = &updates.seeking_venue {
        builder.set("seeking_venue", Box::new(*seeking));
    }
    if let Some(desc) = &updates.seeking_description {
        builder.set("seeking_description", Box::new(desc.clone()));
    }

    if builder.is_empty() {
        let _ = get_artist(conn, id)?;
        return Ok(());
    }

    let count = builder.execute(conn, "artists", id)?;
    if count == 0 {
        return Err(ListingError::ArtistNotFound(id));
    }
    Ok(())
}

/// Lists all artists as `{id, name}` rows.
pub fn list_artists(conn: &Connection) -> Result<Vec<(i64, String)>, ListingError> {
    let mut stmt = conn.prepare("SELECT id, name FROM artists ORDER BY name ASC")?;
    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
    let mut artists = Vec::new();
    for row in rows {
        artists.push(row?);
    }
    Ok(artists)
}

/// Case-insensitive substring search on artist names.
pub fn search_artists(
    conn: &Connection,
    term: &str,
    now: &str,
) -> Result<Vec<ListingSummary>, ListingError> {
    let pattern = like_pattern(term);
    let mut stmt = conn.prepare(
        "SELECT a.id, a.name,
                (SELECT COUNT(*) FROM shows s WHERE s.artist_id = a.id AND s.start_time > ?2)
         FROM artists a
         WHERE a.name LIKE ?1 ESCAPE '\\'
         ORDER BY a.name ASC",
    )?;

    let rows = stmt.query_map(params![pattern, now], map_row_to_summary)?;
    collect(rows)
}

/// Past and upcoming shows for an artist, relative to `now`.
pub fn artist_shows(
    conn: &Connection,
    artist_id: i64,
    now: &str,
) -> Result<ShowPartition<ArtistShow>, ListingError> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM artists WHERE id = ?1)",
        [artist_id],
        |row| row.get(0),
    )?;
    if !exists {
        return Err(ListingError::ArtistNotFound(artist_id));
    }

    let mut stmt = conn.prepare(
        "SELECT s.venue_id, v.name, v.image_link, s.start_time
         FROM shows s JOIN venues v ON v.id = s.venue_id
         WHERE s.artist_id = ?1
         ORDER BY s.start_time ASC",
    )?;

    let rows = stmt.query_map([artist_id], |row| {
        Ok(ArtistShow {
            venue_id: row.get(0)?,
            venue_name: row.get(1)?,
            venue_image_link: row.get(2)?,
            start_time: row.get(3)?,
        })
    })?;

    let mut partition = ShowPartition {
        past: Vec::new(),
        upcoming: Vec::new(),
    };
    for row in rows {
        let show = row?;
        if show.start_time.as_str() > now {
            partition.upcoming.push(show);
        } else {
            partition.past.push(show);
        }
    }
    Ok(partition)
}

// --- Shows ---

/// Creates a new show, returning its assigned ID.
///
/// A show referencing a missing artist or venue fails FK enforcement and
/// surfaces as a database error for the caller to map.
pub fn create_show(conn: &Connection, show: &NewShow) -> Result<i64, ListingError> {
    conn.execute(
        "INSERT INTO shows (artist_id, venue_id, start_time) VALUES (?1, ?2, ?3)",
        params![show.artist_id, show.venue_id, show.start_time],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Lists all shows joined with venue and artist names, soonest first.
pub fn list_shows(conn: &Connection) -> Result<Vec<ShowListing>, ListingError> {
    let mut stmt = conn.prepare(
        "SELECT s.venue_id, v.name, s.artist_id, a.name, a.image_link, s.start_time
         FROM shows s
         JOIN venues v ON v.id = s.venue_id
         JOIN artists a ON a.id = s.artist_id
         ORDER BY s.start_time ASC",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok(ShowListing {
            venue_id: row.get(0)?,
            venue_name: row.get(1)?,
            artist_id: row.get(2)?,
            artist_name: row.get(3)?,
            artist_image_link: row.get(4)?,
            start_time: row.get(5)?,
        })
    })?;

    let mut shows = Vec::new();
    for row in rows {
        shows.push(row?);
    }
    Ok(shows)
}

/// Accumulates `column = ?N` assignments for a partial UPDATE, keeping
/// the read-modify-write out of application code: only listed fields
/// change, in one statement.
struct UpdateBuilder {
    set_parts: Vec<String>,
    values: Vec<Box<dyn rusqlite::types::ToSql>>,
}

impl UpdateBuilder {
    fn new() -> Self {
        Self {
            set_parts: Vec::new(),
            values: Vec::new(),
        }
    }

    fn set(&mut self, column: &str, value: Box<dyn rusqlite::types::ToSql>) {
        self.set_parts
            .push(format!("{} = ?{}", column, self.values.len() + 1));
        self.values.push(value);
    }

    fn is_empty(&self) -> bool {
        self.set_parts.is_empty()
    }

    fn execute(mut self, conn: &Connection, table: &str, id: i64) -> rusqlite::Result<usize> {
        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?{}",
            table,
            self.set_parts.join(", "),
            self.values.len() + 1
        );
        self.values.push(Box::new(id));
        let params: Vec<&dyn rusqlite::types::ToSql> =
            self.values.iter().map(|v| v.as_ref()).collect();
        conn.execute(&sql, params.as_slice())
    }
}

// --- Row mapping helpers ---

/// Escapes LIKE wildcards in a user-supplied search term and wraps it in
/// `%...%`. SQLite's LIKE is case-insensitive for ASCII by default.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn parse_genres(idx: usize, json: String) -> rusqlite::Result<Vec<String>> {
    serde_json::from_str(&json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn map_row_to_venue(row: &Row) -> rusqlite::Result<Venue> {
    let genres = parse_genres(2, row.get(2)?)?;
    Ok(Venue {
        id: row.get(0)?,
        name: row.get(1)?,
        genres,
        city: row.get(3)?,
        state: row.get(4)?,
        address: row.get(5)?,
        phone: row.get(6)?,
        image_link: row.get(7)?,
        facebook_link: row.get(8)?,
        website: row.get(9)?,
        seeking_talent: row.get(10)?,
        seeking_description: row.get(11)?,
    })
}

fn map_row_to_artist(row: &Row) -> rusqlite::Result<Artist> {
    let genres = parse_genres(2, row.get(2)?)?;
    Ok(Artist {
        id: row.get(0)?,
        name: row.get(1)?,
        genres,
        city: row.get(3)?,
        state: row.get(4)?,
        phone: row.get(5)?,
        image_link: row.get(6)?,
        facebook_link: row.get(7)?,
        website: row.get(8)?,
        seeking_venue: row.get(9)?,
        seeking_description: row.get(10)?,
    })
}

fn map_row_to_summary(row: &Row) -> rusqlite::Result<ListingSummary> {
    Ok(ListingSummary {
        id: row.get(0)?,
        name: row.get(1)?,
        num_upcoming_shows: row.get(2)?,
    })
}

fn collect<I>(rows: I) -> Result<Vec<ListingSummary>, ListingError>
where
    I: Iterator<Item = rusqlite::Result<ListingSummary>>,
{
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use medley_db::run_venues_migrations;
    use rusqlite::Connection;

    const NOW: &str = "2026-06-01T00:00:00Z";

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().expect("should open in-memory db");
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        run_venues_migrations(&conn).expect("migrations should succeed");
        conn
    }

    fn sample_venue(name: &str, city: &str) -> NewVenue {
        NewVenue {
            name: name.to_string(),
            genres: vec!["Jazz".to_string(), "Folk".to_string()],
            city: city.to_string(),
            state: "CA".to_string(),
            address: "123 Main St".to_string(),
            phone: Some("415-000-0000".to_string()),
            image_link: None,
            facebook_link: None,
            website: None,
            seeking_talent: false,
            seeking_description: None,
        }
    }

    fn sample_artist(name: &str) -> NewArtist {
        NewArtist {
            name: name.to_string(),
            genres: vec!["Rock".to_string()],
            city: "Oakland".to_string(),
            state: "CA".to_string(),
            phone: None,
            image_link: Some("https://img.example/artist.png".to_string()),
            facebook_link: None,
            website: None,
            seeking_venue: true,
            seeking_description: Some("Looking for weekend gigs".to_string()),
        }
    }

    #[test]
    fn venue_crud_round_trip() {
        let conn = test_conn();

        let id = create_venue(&conn, &sample_venue("The Dive", "San Francisco")).unwrap();
        let venue = get_venue(&conn, id).unwrap();
        assert_eq!(venue.name, "The Dive");
        assert_eq!(venue.genres, vec!["Jazz", "Folk"]);
        assert!(!venue.seeking_talent);

        update_venue(
            &conn,
            id,
            &VenueUpdate {
                name: Some("The Dive Bar".to_string()),
                seeking_talent: Some(true),
                ..Default::default()
            },
        )
        .unwrap();

        let venue = get_venue(&conn, id).unwrap();
        assert_eq!(venue.name, "The Dive Bar");
        assert!(venue.seeking_talent);
        // Untouched fields survive a partial update.
        assert_eq!(venue.city, "San Francisco");

        delete_venue(&conn, id).unwrap();
        assert!(matches!(
            get_venue(&conn, id),
            Err(ListingError::VenueNotFound(_))
        ));
    }

    #[test]
    fn update_missing_venue_is_not_found() {
        let conn = test_conn();
        let err = update_venue(
            &conn,
            999,
            &VenueUpdate {
                name: Some("ghost".to_string()),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, ListingError::VenueNotFound(999)));
    }

    #[test]
    fn delete_venue_cascades_to_shows() {
        let conn = test_conn();
        let venue_id = create_venue(&conn, &sample_venue("Hall", "Berkeley")).unwrap();
        let artist_id = create_artist(&conn, &sample_artist("Quartet")).unwrap();
        create_show(
            &conn,
            &NewShow {
                artist_id,
                venue_id,
                start_time: "2026-07-01T20:00:00Z".to_string(),
            },
        )
        .unwrap();

        delete_venue(&conn, venue_id).unwrap();

        let remaining: i64 = conn
            .query_row("SELECT COUNT(*) FROM shows", [], |row| row.get(0))
            .unwrap();
        assert_eq!(remaining, 0);
    }

    #[test]
    fn grouped_listing_groups_by_city_and_counts_upcoming() {
        let conn = test_conn();
        let v1 = create_venue(&conn, &sample_venue("Alpha", "Berkeley")).unwrap();
        let _v2 = create_venue(&conn, &sample_venue("Beta", "Berkeley")).unwrap();
        let _v3 = create_venue(&conn, &sample_venue("Gamma", "Oakland")).unwrap();
        let artist = create_artist(&conn, &sample_artist("Band")).unwrap();

        // One past and one upcoming show at Alpha.
        for start in ["2026-01-01T20:00:00Z", "2026-12-01T20:00:00Z"] {
            create_show(
                &conn,
                &NewShow {
                    artist_id: artist,
                    venue_id: v1,
                    start_time: start.to_string(),
                },
            )
            .unwrap();
        }

        let groups = list_venues_grouped(&conn, NOW).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].city, "Berkeley");
        assert_eq!(groups[0].venues.len(), 2);
        assert_eq!(groups[0].venues[0].name, "Alpha");
        assert_eq!(groups[0].venues[0].num_upcoming_shows, 1);
        assert_eq!(groups[1].city, "Oakland");
        assert_eq!(groups[1].venues.len(), 1);
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let conn = test_conn();
        create_venue(&conn, &sample_venue("The Musical Hop", "SF")).unwrap();
        create_venue(&conn, &sample_venue("Park Square Live", "SF")).unwrap();

        let hits = search_venues(&conn, "musical", NOW).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "The Musical Hop");

        let none = search_venues(&conn, "opera", NOW).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn search_escapes_like_wildcards() {
        let conn = test_conn();
        create_venue(&conn, &sample_venue("100% Vinyl", "SF")).unwrap();
        create_venue(&conn, &sample_venue("Plain Hall", "SF")).unwrap();

        let hits = search_venues(&conn, "%", NOW).unwrap();
        assert_eq!(hits.len(), 1, "a literal % should not match everything");
        assert_eq!(hits[0].name, "100% Vinyl");
    }

    #[test]
    fn venue_shows_partition_around_now() {
        let conn = test_conn();
        let venue_id = create_venue(&conn, &sample_venue("Hall", "SF")).unwrap();
        let artist_id = create_artist(&conn, &sample_artist("Solo")).unwrap();

        for start in [
            "2026-01-15T20:00:00Z",
            "2026-05-31T23:59:59Z",
            "2026-08-01T20:00:00Z",
        ] {
            create_show(
                &conn,
                &NewShow {
                    artist_id,
                    venue_id,
                    start_time: start.to_string(),
                },
            )
            .unwrap();
        }

        let partition = venue_shows(&conn, venue_id, NOW).unwrap();
        assert_eq!(partition.past.len(), 2);
        assert_eq!(partition.upcoming.len(), 1);
        assert_eq!(partition.upcoming[0].artist_name, "Solo");
        assert_eq!(
            partition.upcoming[0].artist_image_link.as_deref(),
            Some("https://img.example/artist.png")
        );
    }

    #[test]
    fn venue_shows_missing_venue_is_not_found() {
        let conn = test_conn();
        assert!(matches!(
            venue_shows(&conn, 42, NOW),
            Err(ListingError::VenueNotFound(42))
        ));
    }

    #[test]
    fn artist_crud_and_shows() {
        let conn = test_conn();
        let artist_id = create_artist(&conn, &sample_artist("Duo")).unwrap();
        let venue_id = create_venue(&conn, &sample_venue("Spot", "SF")).unwrap();

        update_artist(
            &conn,
            artist_id,
            &ArtistUpdate {
                phone: Some("510-000-0000".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        let artist = get_artist(&conn, artist_id).unwrap();
        assert_eq!(artist.phone.as_deref(), Some("510-000-0000"));
        assert!(artist.seeking_venue);

        create_show(
            &conn,
            &NewShow {
                artist_id,
                venue_id,
                start_time: "2026-09-01T19:00:00Z".to_string(),
            },
        )
        .unwrap();

        let partition = artist_shows(&conn, artist_id, NOW).unwrap();
        assert_eq!(partition.upcoming.len(), 1);
        assert_eq!(partition.upcoming[0].venue_name, "Spot");

        let names = list_artists(&conn).unwrap();
        assert_eq!(names, vec![(artist_id, "Duo".to_string())]);
    }

    #[test]
    fn create_show_rejects_missing_references() {
        let conn = test_conn();
        let err = create_show(
            &conn,
            &NewShow {
                artist_id: 1,
                venue_id: 1,
                start_time: "2026-09-01T19:00:00Z".to_string(),
            },
        )
        .unwrap_err();
        assert!(matches!(err, ListingError::Database(_)));
    }

    #[test]
    fn show_listing_joins_names() {
        let conn = test_conn();
        let venue_id = create_venue(&conn, &sample_venue("Hall", "SF")).unwrap();
        let artist_id = create_artist(&conn, &sample_artist("Trio")).unwrap();
        create_show(
            &conn,
            &NewShow {
                artist_id,
                venue_id,
                start_time: "2026-09-01T19:00:00Z".to_string(),
            },
        )
        .unwrap();

        let shows = list_shows(&conn).unwrap();
        assert_eq!(shows.len(), 1);
        assert_eq!(shows[0].venue_name, "Hall");
        assert_eq!(shows[0].artist_name, "Trio");
    }
}
