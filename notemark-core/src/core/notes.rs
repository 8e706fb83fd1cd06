//! Queries over the `notes` collection.

use crate::core::html::plain_text;
use crate::core::storage::Mode;
use crate::{Collection, NoteRecord, NotemarkError, Record, Result, Storage};

impl Storage {
    pub fn save_note(&self, note: &NoteRecord) -> Result<()> {
        self.put(note)
    }

    pub fn get_note(&self, id: &str) -> Result<Option<NoteRecord>> {
        self.get(id)
    }

    /// Deletes a note by id. Deleting a missing note succeeds.
    pub fn delete_note(&self, id: &str) -> Result<()> {
        self.delete::<NoteRecord>(id)
    }

    /// Every note, most recently created first. Notes created at the same
    /// instant come in descending id order.
    pub fn list_notes_newest_first(&self) -> Result<Vec<NoteRecord>> {
        let sql = format!(
            "SELECT value FROM {} ORDER BY json_extract(value, '$.createAt') DESC, id DESC",
            NoteRecord::COLLECTION
        );
        let rows = self.scan(&sql)?;
        rows.iter().map(|json| decode_note(json)).collect()
    }

    /// Notes whose title or plain-text body contains `keyword`, ignoring case.
    ///
    /// Marker internals are not searched.
    ///
    /// # Errors
    ///
    /// Returns [`NotemarkError::InvalidArgument`] for an empty or blank
    /// keyword, without touching the store.
    pub fn search_notes(&self, keyword: &str) -> Result<Vec<NoteRecord>> {
        if keyword.trim().is_empty() {
            return Err(NotemarkError::InvalidArgument(
                "Please enter a search keyword".to_string(),
            ));
        }
        let needle = keyword.to_lowercase();

        let sql = format!("SELECT value FROM {}", NoteRecord::COLLECTION);
        let mut matches = Vec::new();
        for json in self.scan(&sql)? {
            let note = decode_note(&json)?;
            if note.title.to_lowercase().contains(&needle)
                || plain_text(&note.content).to_lowercase().contains(&needle)
            {
                matches.push(note);
            }
        }
        Ok(matches)
    }

    fn scan(&self, sql: &str) -> Result<Vec<String>> {
        self.transact(Collection::Notes, Mode::ReadOnly, |tx| {
            let mut stmt = tx.prepare(sql)?;
            let rows = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }
}

fn decode_note(json: &str) -> Result<NoteRecord> {
    serde_json::from_str(json).map_err(|e| NotemarkError::storage(Collection::Notes, e))
}
