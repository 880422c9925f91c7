use log::debug;
use rusqlite::{params, OptionalExtension, Row};

use crate::error::{StoreError, StoreResult};
use crate::models::{NewPlace, Place, PlaceId};

use super::connection::PlaceStore;

fn place_from_row(row: &Row<'_>) -> rusqlite::Result<Place> {
    Ok(Place {
        id: PlaceId::new(row.get(0)?),
        name: row.get(1)?,
        latitude: row.get(2)?,
        longitude: row.get(3)?,
    })
}

fn check_name(name: &str) -> StoreResult<()> {
    if name.trim().is_empty() {
        Err(StoreError::EmptyName)
    } else {
        Ok(())
    }
}

impl PlaceStore {
    /// Insert a new place and hand back the id SQLite assigned to it.
    pub fn add(&self, place: &NewPlace) -> StoreResult<PlaceId> {
        check_name(&place.name)?;
        self.conn.execute(
            "INSERT INTO places (name, latitude, longitude) VALUES (?1, ?2, ?3)",
            params![place.name, place.latitude, place.longitude],
        )?;

        let id = PlaceId::new(self.conn.last_insert_rowid());
        debug!("added place {id} ({})", place.name);
        Ok(id)
    }

    /// Every saved place, most recently added first.
    pub fn get_all(&self) -> StoreResult<Vec<Place>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, latitude, longitude FROM places ORDER BY id DESC")?;

        let places = stmt
            .query_map([], place_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(places)
    }

    pub fn get_by_id(&self, id: PlaceId) -> StoreResult<Option<Place>> {
        let place = self
            .conn
            .query_row(
                "SELECT id, name, latitude, longitude FROM places WHERE id = ?1",
                params![id.get()],
                place_from_row,
            )
            .optional()?;

        Ok(place)
    }

    /// Overwrite name and coordinates of an existing row. Returns the number of
    /// rows touched, so `0` means the id no longer exists.
    pub fn update(&self, place: &Place) -> StoreResult<usize> {
        check_name(&place.name)?;
        let updated = self.conn.execute(
            "UPDATE places SET name = ?1, latitude = ?2, longitude = ?3 WHERE id = ?4",
            params![place.name, place.latitude, place.longitude, place.id.get()],
        )?;

        debug!("updated place {} ({updated} row(s))", place.id);
        Ok(updated)
    }

    /// Remove a row. Deleting an id that is not there is a no-op.
    pub fn delete_by_id(&self, id: PlaceId) -> StoreResult<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM places WHERE id = ?1", params![id.get()])?;

        debug!("delete place {id}: {deleted} row(s) removed");
        Ok(())
    }

    pub fn delete_all(&self) -> StoreResult<usize> {
        let deleted = self.conn.execute("DELETE FROM places", [])?;
        debug!("deleted all places ({deleted} row(s))");
        Ok(deleted)
    }

    pub fn count(&self) -> StoreResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM places", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
