use log::{debug, info};
use rusqlite::types::Value;
use rusqlite::{params, OptionalExtension, Row, Statement};

use crate::error::{LogError, Result};
use crate::models::{now_stamp, parse_numeric, NewQso, Qso, QsoCandidate, QsoField, SearchField};

use super::Store;

const SELECT_QSO: &str = "SELECT id, call, mode, freq, power, datetime, qth_prov, qth_city,
            rst_sent, rst_recv, content, device, addtime
     FROM qso";

const INSERT_QSO: &str = "INSERT INTO qso (call, mode, freq, power, datetime, qth_prov, qth_city,
                      rst_sent, rst_recv, content, device, addtime)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)";

impl Store {
    /// Insert one contact entered by hand. The call sign must be present; the
    /// canonical columns are upper-cased and `addtime` is stamped with the
    /// current local time. Returns the new row id.
    pub fn insert(&self, qso: &NewQso) -> Result<i64> {
        if qso.call.trim().is_empty() {
            return Err(LogError::validation("call", "call sign must not be empty"));
        }

        let qso = qso.clone().canonicalized();
        let addtime = now_stamp();

        let conn = self.connect()?;
        let mut stmt = conn
            .prepare(INSERT_QSO)
            .map_err(LogError::storage("prepare qso insert"))?;
        insert_row(&mut stmt, &qso, &addtime).map_err(LogError::storage("insert qso"))?;

        let id = conn.last_insert_rowid();
        info!("logged QSO #{id} with {}", qso.call);
        Ok(id)
    }

    /// Insert already-normalized rows (typically from an ADIF import) inside a
    /// single transaction. Either every row lands or none do.
    pub fn insert_batch(&self, candidates: &[QsoCandidate]) -> Result<usize> {
        if candidates.is_empty() {
            return Ok(0);
        }

        let mut conn = self.connect()?;
        let tx = conn
            .transaction()
            .map_err(LogError::storage("begin batch insert"))?;

        let mut inserted = 0;
        {
            let mut stmt = tx
                .prepare(INSERT_QSO)
                .map_err(LogError::storage("prepare batch insert"))?;
            for candidate in candidates {
                inserted += insert_row(&mut stmt, &candidate.qso, &candidate.addtime)
                    .map_err(LogError::storage("batch insert"))?;
            }
        }

        tx.commit().map_err(LogError::storage("commit batch insert"))?;
        info!("batch inserted {inserted} QSOs");
        Ok(inserted)
    }

    /// Permanently delete a contact. Deleting an id that does not exist is a
    /// no-op; the return value tells whether a row was actually removed.
    pub fn delete_by_id(&self, id: i64) -> Result<bool> {
        let conn = self.connect()?;
        let deleted = conn
            .execute("DELETE FROM qso WHERE id = ?1", params![id])
            .map_err(LogError::storage("delete qso"))?;

        if deleted == 0 {
            debug!("delete of QSO #{id} matched no row");
        } else {
            info!("deleted QSO #{id}");
        }
        Ok(deleted > 0)
    }

    /// Update one column by its field identifier (`"call"`, `"rst_sent"`, ...).
    /// Unknown identifiers are rejected before the database is touched.
    pub fn update_field(&self, id: i64, field_name: &str, value: &str) -> Result<bool> {
        let field: QsoField = field_name.parse()?;
        self.update(id, field, value)
    }

    /// Typed form of [`Store::update_field`]. Canonical columns are
    /// upper-cased; `freq`/`power` must be blank or numeric. Updating a
    /// missing id changes nothing and is not an error.
    pub fn update(&self, id: i64, field: QsoField, value: &str) -> Result<bool> {
        if field == QsoField::Call && value.trim().is_empty() {
            return Err(LogError::validation("call", "call sign must not be empty"));
        }

        let sql = format!("UPDATE qso SET {} = ?1 WHERE id = ?2", field.as_str());
        let conn = self.connect()?;
        let updated = if field.is_numeric() {
            let number = parse_numeric(field, value)?;
            conn.execute(&sql, params![number, id])
        } else {
            conn.execute(&sql, params![field.canonicalize(value), id])
        }
        .map_err(LogError::storage("update qso"))?;

        if updated == 0 {
            debug!("update of QSO #{id} matched no row");
        } else {
            info!("updated {field} on QSO #{id}");
        }
        Ok(updated > 0)
    }

    /// Case-insensitive substring search on one column, newest `datetime`
    /// first. An empty keyword returns the whole log.
    ///
    /// Ordering compares the `datetime` text, so entries typed in different
    /// formats do not sort chronologically against each other.
    pub fn search(&self, keyword: &str, by: SearchField) -> Result<Vec<Qso>> {
        let conn = self.connect()?;

        let (sql, pattern) = if keyword.is_empty() {
            (format!("{SELECT_QSO} ORDER BY datetime DESC, id DESC"), None)
        } else {
            (
                format!(
                    "{SELECT_QSO} WHERE UPPER({}) LIKE ?1 ESCAPE '\\' ORDER BY datetime DESC, id DESC",
                    by.column()
                ),
                Some(format!("%{}%", escape_like(&keyword.to_uppercase()))),
            )
        };

        let mut stmt = conn
            .prepare(&sql)
            .map_err(LogError::storage("prepare qso search"))?;

        let rows = match &pattern {
            Some(pattern) => stmt.query_map(params![pattern], qso_from_row),
            None => stmt.query_map([], qso_from_row),
        }
        .map_err(LogError::storage("search qsos"))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(LogError::storage("read qso rows"))?;

        Ok(rows)
    }

    /// Every stored contact, in search order.
    pub fn fetch_all(&self) -> Result<Vec<Qso>> {
        self.search("", SearchField::Call)
    }

    /// Look up one contact by id.
    pub fn get(&self, id: i64) -> Result<Option<Qso>> {
        let conn = self.connect()?;
        conn.query_row(
            &format!("{SELECT_QSO} WHERE id = ?1"),
            params![id],
            qso_from_row,
        )
        .optional()
        .map_err(LogError::storage("load qso"))
    }

    /// Number of stored contacts.
    pub fn count(&self) -> Result<usize> {
        let conn = self.connect()?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM qso", [], |row| row.get(0))
            .map_err(LogError::storage("count qsos"))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

fn insert_row(stmt: &mut Statement<'_>, qso: &NewQso, addtime: &str) -> rusqlite::Result<usize> {
    stmt.execute(params![
        qso.call,
        qso.mode,
        qso.freq,
        qso.power,
        qso.datetime,
        qso.qth_prov,
        qso.qth_city,
        qso.rst_sent,
        qso.rst_recv,
        qso.content,
        qso.device,
        addtime,
    ])
}

fn qso_from_row(row: &Row<'_>) -> rusqlite::Result<Qso> {
    Ok(Qso {
        id: row.get(0)?,
        call: text_column(row, 1)?,
        mode: text_column(row, 2)?,
        freq: numeric_column(row, 3)?,
        power: numeric_column(row, 4)?,
        datetime: text_column(row, 5)?,
        qth_prov: text_column(row, 6)?,
        qth_city: text_column(row, 7)?,
        rst_sent: text_column(row, 8)?,
        rst_recv: text_column(row, 9)?,
        content: text_column(row, 10)?,
        device: text_column(row, 11)?,
        addtime: text_column(row, 12)?,
    })
}

fn text_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<String> {
    Ok(row.get::<_, Option<String>>(idx)?.unwrap_or_default())
}

/// SQLite keeps whatever the column was given, so older databases may hold
/// numbers as text. Anything that does not read as a number comes back empty.
fn numeric_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<f64>> {
    let value = match row.get::<_, Value>(idx)? {
        Value::Real(v) => Some(v),
        Value::Integer(v) => Some(v as f64),
        Value::Text(text) => text.trim().parse().ok(),
        Value::Null | Value::Blob(_) => None,
    };
    Ok(value)
}

/// Escape LIKE wildcards so a keyword is matched literally.
fn escape_like(keyword: &str) -> String {
    let mut escaped = String::with_capacity(keyword.len());
    for ch in keyword.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn open_store() -> (TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path().join("hamlog.db"));
        store.initialize().unwrap();
        (dir, store)
    }

    fn contact(call: &str, datetime: &str) -> NewQso {
        NewQso {
            call: call.into(),
            datetime: datetime.into(),
            ..NewQso::default()
        }
    }

    fn candidate(call: &str) -> QsoCandidate {
        QsoCandidate {
            qso: contact(call, "2024-02-01 08:00"),
            addtime: "2024-02-01 09:00".into(),
        }
    }

    #[test]
    fn insert_canonicalizes_and_stamps_addtime() {
        let (_dir, store) = open_store();
        let before = now_stamp();

        let id = store
            .insert(&NewQso {
                call: "bg5jqn".into(),
                mode: "ssb".into(),
                freq: Some(14.25),
                power: Some(50.0),
                datetime: "2024-01-01 10:00".into(),
                qth_prov: "bj".into(),
                qth_city: "bj".into(),
                rst_sent: "59".into(),
                rst_recv: "59".into(),
                content: "nice contact".into(),
                device: "ft-991".into(),
            })
            .unwrap();

        let after = now_stamp();
        let stored = store.get(id).unwrap().unwrap();
        assert_eq!(stored.call, "BG5JQN");
        assert_eq!(stored.mode, "SSB");
        assert_eq!(stored.device, "FT-991");
        assert_eq!(stored.qth_city, "BJ");
        assert_eq!(stored.content, "nice contact");
        assert_eq!(stored.freq, Some(14.25));
        assert_eq!(stored.power, Some(50.0));
        assert_eq!(stored.datetime, "2024-01-01 10:00");
        assert!(stored.addtime == before || stored.addtime == after);
    }

    #[test]
    fn insert_rejects_empty_call_without_writing() {
        let (_dir, store) = open_store();
        store.insert(&contact("K1ABC", "")).unwrap();

        let err = store.insert(&contact("", "2024-01-01 10:00")).unwrap_err();
        assert!(err.is_validation());
        assert!(store.insert(&contact("   ", "")).unwrap_err().is_validation());
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn ids_increase_and_are_not_reused() {
        let (_dir, store) = open_store();
        let first = store.insert(&contact("K1ABC", "")).unwrap();
        let second = store.insert(&contact("K2ABC", "")).unwrap();
        store.delete_by_id(second).unwrap();
        let third = store.insert(&contact("K3ABC", "")).unwrap();

        assert!(second > first);
        assert!(third > second);
    }

    #[test]
    fn delete_missing_id_is_a_no_op() {
        let (_dir, store) = open_store();
        let id = store.insert(&contact("K1ABC", "")).unwrap();

        assert!(!store.delete_by_id(id + 100).unwrap());
        assert_eq!(store.count().unwrap(), 1);

        assert!(store.delete_by_id(id).unwrap());
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn update_field_applies_canonicalization_rules() {
        let (_dir, store) = open_store();
        let id = store.insert(&contact("K1ABC", "2024-01-01 10:00")).unwrap();

        store.update_field(id, "device", "ic-7300").unwrap();
        store.update_field(id, "content", "Worked on 20m").unwrap();
        store.update_field(id, "freq", "7.074").unwrap();

        let stored = store.get(id).unwrap().unwrap();
        assert_eq!(stored.device, "IC-7300");
        assert_eq!(stored.content, "Worked on 20m");
        assert_eq!(stored.freq, Some(7.074));

        store.update_field(id, "freq", "").unwrap();
        assert_eq!(store.get(id).unwrap().unwrap().freq, None);
    }

    #[test]
    fn update_field_rejects_unknown_names_and_leaves_row_alone() {
        let (_dir, store) = open_store();
        let id = store.insert(&contact("K1ABC", "2024-01-01 10:00")).unwrap();
        let before = store.get(id).unwrap();

        assert!(store.update_field(id, "addtime", "x").unwrap_err().is_validation());
        assert!(store.update_field(id, "呼号", "x").unwrap_err().is_validation());
        assert!(store.update_field(id, "power", "lots").unwrap_err().is_validation());
        assert!(store.update_field(id, "call", "").unwrap_err().is_validation());

        assert_eq!(store.get(id).unwrap(), before);
    }

    #[test]
    fn update_missing_id_is_a_no_op() {
        let (_dir, store) = open_store();
        assert!(!store.update_field(42, "mode", "cw").unwrap());
    }

    #[test]
    fn empty_batch_inserts_nothing() {
        let (_dir, store) = open_store();
        assert_eq!(store.insert_batch(&[]).unwrap(), 0);
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn batch_inserts_all_rows_verbatim() {
        let (_dir, store) = open_store();
        let mut lower = candidate("k1abc");
        lower.qso.mode = "ft8".into();

        assert_eq!(store.insert_batch(&[lower, candidate("N2XYZ")]).unwrap(), 2);

        let all = store.fetch_all().unwrap();
        assert_eq!(all.len(), 2);
        let k1 = all.iter().find(|q| q.call == "k1abc").unwrap();
        assert_eq!(k1.mode, "ft8");
        assert_eq!(k1.addtime, "2024-02-01 09:00");
    }

    #[test]
    fn batch_with_a_bad_row_commits_nothing() {
        let (_dir, store) = open_store();
        store.insert(&contact("K1ABC", "")).unwrap();

        let err = store
            .insert_batch(&[candidate("N2XYZ"), candidate(""), candidate("K3AB")])
            .unwrap_err();

        assert!(err.is_storage());
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn empty_keyword_returns_everything_newest_first() {
        let (_dir, store) = open_store();
        store.insert(&contact("A1A", "2024-01-02 10:00")).unwrap();
        store.insert(&contact("B1B", "2024-03-01 09:00")).unwrap();
        store.insert(&contact("C1C", "2023-12-31 23:59")).unwrap();

        let calls: Vec<_> = store
            .search("", SearchField::Power)
            .unwrap()
            .into_iter()
            .map(|q| q.call)
            .collect();
        assert_eq!(calls, ["B1B", "A1A", "C1C"]);
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let (_dir, store) = open_store();
        store.insert(&contact("bg5jqn", "2024-01-01 10:00")).unwrap();
        store.insert(&contact("BG7XYZ", "2024-01-02 10:00")).unwrap();
        store.insert(&contact("K1ABC", "2024-01-03 10:00")).unwrap();

        let hits = store.search("5jq", SearchField::Call).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].call, "BG5JQN");

        assert_eq!(store.search("bg", SearchField::Call).unwrap().len(), 2);
        assert!(store.search("zzz", SearchField::Call).unwrap().is_empty());
    }

    #[test]
    fn search_numeric_and_time_columns_as_text() {
        let (_dir, store) = open_store();
        let mut qso = contact("K1ABC", "2024-05-06 07:08");
        qso.freq = Some(14.074);
        qso.power = Some(100.0);
        store.insert(&qso).unwrap();
        store.insert(&contact("N2XYZ", "2023-05-06 07:08")).unwrap();

        assert_eq!(store.search("14.07", SearchField::Freq).unwrap().len(), 1);
        assert_eq!(store.search("100", SearchField::Power).unwrap().len(), 1);
        assert_eq!(store.search("2024-05", SearchField::Time).unwrap().len(), 1);
        assert_eq!(store.search("05-06", SearchField::Time).unwrap().len(), 2);
    }

    #[test]
    fn search_treats_like_wildcards_literally() {
        let (_dir, store) = open_store();
        store.insert(&contact("K1ABC", "")).unwrap();
        store.insert(&contact("K1_AB", "")).unwrap();

        let hits = store.search("1_", SearchField::Call).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].call, "K1_AB");
        assert!(store.search("%", SearchField::Call).unwrap().is_empty());
    }

    #[test]
    fn numeric_columns_tolerate_legacy_text() {
        let (_dir, store) = open_store();
        store
            .connect()
            .unwrap()
            .execute(
                "INSERT INTO qso (call, freq, power, addtime) VALUES ('K1ABC', 'n/a', '5', '')",
                [],
            )
            .unwrap();

        let all = store.fetch_all().unwrap();
        assert_eq!(all[0].freq, None);
        assert_eq!(all[0].power, Some(5.0));
        assert_eq!(all[0].mode, "");
    }
}
