use anyhow::Result;
use rusqlite::{params, Row};

use crate::{
    db::{helpers::parse_kind, Database},
    models::ExerciseDefinition,
};

fn row_to_exercise(row: &Row) -> Result<ExerciseDefinition> {
    let kind: String = row.get("kind")?;
    Ok(ExerciseDefinition {
        id: row.get("id")?,
        name: row.get("name")?,
        kind: parse_kind(&kind)?,
    })
}

impl Database {
    pub async fn upsert_exercise(&self, exercise: &ExerciseDefinition) -> Result<()> {
        let record = exercise.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO exercises (id, name, kind) VALUES (?1, ?2, ?3)
                 ON CONFLICT(id) DO UPDATE SET name = excluded.name, kind = excluded.kind",
                params![record.id, record.name, record.kind.as_str()],
            )?;
            Ok(())
        })
        .await
    }

    pub async fn get_exercise(&self, exercise_id: &str) -> Result<Option<ExerciseDefinition>> {
        let exercise_id = exercise_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare("SELECT id, name, kind FROM exercises WHERE id = ?1")?;
            let mut rows = stmt.query(params![exercise_id])?;
            match rows.next()? {
                Some(row) => Ok(Some(row_to_exercise(row)?)),
                None => Ok(None),
            }
        })
        .await
    }

    pub async fn delete_exercise(&self, exercise_id: &str) -> Result<()> {
        let exercise_id = exercise_id.to_string();
        self.execute(move |conn| {
            conn.execute("DELETE FROM exercises WHERE id = ?1", params![exercise_id])?;
            Ok(())
        })
        .await
    }

    pub async fn list_exercises(&self) -> Result<Vec<ExerciseDefinition>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare("SELECT id, name, kind FROM exercises ORDER BY name ASC")?;
            let mut rows = stmt.query([])?;
            let mut exercises = Vec::new();
            while let Some(row) = rows.next()? {
                exercises.push(row_to_exercise(row)?);
            }
            Ok(exercises)
        })
        .await
    }
}
