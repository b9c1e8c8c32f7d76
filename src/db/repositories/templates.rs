use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection};

use crate::{
    db::{
        helpers::{to_optional_u32, to_position, to_u32},
        Database,
    },
    models::{TemplateExercise, TemplateSet, WorkoutTemplate},
};

fn load_sets(conn: &Connection, template_id: &str, exercise_position: i64) -> Result<Vec<TemplateSet>> {
    let mut stmt = conn.prepare(
        "SELECT reps, weight, time_seconds, distance_meters
         FROM template_sets
         WHERE template_id = ?1 AND exercise_position = ?2
         ORDER BY position ASC",
    )?;
    let mut rows = stmt.query(params![template_id, exercise_position])?;
    let mut sets = Vec::new();
    while let Some(row) = rows.next()? {
        sets.push(TemplateSet {
            reps: to_optional_u32(row.get("reps")?, "reps")?,
            weight: row.get("weight")?,
            time: to_optional_u32(row.get("time_seconds")?, "time_seconds")?,
            distance: to_optional_u32(row.get("distance_meters")?, "distance_meters")?,
        });
    }
    Ok(sets)
}

fn write_exercises(conn: &Connection, template_id: &str, exercises: &[TemplateExercise]) -> Result<()> {
    conn.execute(
        "DELETE FROM template_sets WHERE template_id = ?1",
        params![template_id],
    )?;
    conn.execute(
        "DELETE FROM template_exercises WHERE template_id = ?1",
        params![template_id],
    )?;

    for (position, exercise) in exercises.iter().enumerate() {
        let exercise_position = to_position(position)?;
        conn.execute(
            "INSERT INTO template_exercises
                (template_id, position, exercise_id, target_reps, rest_seconds, next_exercise_rest_seconds, notes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                template_id,
                exercise_position,
                exercise.exercise_id,
                exercise.target_reps,
                exercise.rest_seconds,
                exercise.next_exercise_rest_seconds,
                exercise.notes,
            ],
        )
        .with_context(|| format!("failed to write template exercise {position}"))?;

        for (set_position, set) in exercise.sets.iter().enumerate() {
            conn.execute(
                "INSERT INTO template_sets
                    (template_id, exercise_position, position, reps, weight, time_seconds, distance_meters)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    template_id,
                    exercise_position,
                    to_position(set_position)?,
                    set.reps,
                    set.weight,
                    set.time,
                    set.distance,
                ],
            )?;
        }
    }

    Ok(())
}

impl Database {
    pub async fn create_template(&self, template: &WorkoutTemplate) -> Result<()> {
        let record = template.clone();
        self.execute(move |conn| {
            let now = Utc::now().to_rfc3339();
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO templates (id, name, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
                params![record.id, record.name, now],
            )
            .with_context(|| "failed to insert template")?;
            write_exercises(&tx, &record.id, &record.exercises)?;
            tx.commit()?;
            Ok(())
        })
        .await
    }

    pub async fn load_template(&self, template_id: &str) -> Result<Option<WorkoutTemplate>> {
        let template_id = template_id.to_string();
        self.execute(move |conn| {
            let name: Option<String> = {
                let mut stmt = conn.prepare("SELECT name FROM templates WHERE id = ?1")?;
                let mut rows = stmt.query(params![template_id])?;
                match rows.next()? {
                    Some(row) => Some(row.get(0)?),
                    None => None,
                }
            };
            let Some(name) = name else {
                return Ok(None);
            };

            let mut stmt = conn.prepare(
                "SELECT position, exercise_id, target_reps, rest_seconds, next_exercise_rest_seconds, notes
                 FROM template_exercises
                 WHERE template_id = ?1
                 ORDER BY position ASC",
            )?;
            let mut rows = stmt.query(params![template_id])?;
            let mut exercises = Vec::new();
            while let Some(row) = rows.next()? {
                let position: i64 = row.get("position")?;
                exercises.push(TemplateExercise {
                    exercise_id: row.get("exercise_id")?,
                    target_reps: row.get("target_reps")?,
                    rest_seconds: to_u32(row.get("rest_seconds")?, "rest_seconds")?,
                    next_exercise_rest_seconds: to_u32(
                        row.get("next_exercise_rest_seconds")?,
                        "next_exercise_rest_seconds",
                    )?,
                    notes: row.get("notes")?,
                    sets: load_sets(conn, &template_id, position)?,
                });
            }

            Ok(Some(WorkoutTemplate {
                id: template_id.clone(),
                name,
                exercises,
            }))
        })
        .await
    }

    /// Overwrites the template's name, exercises and planned sets.
    pub async fn save_template(&self, template: &WorkoutTemplate) -> Result<()> {
        let record = template.clone();
        self.execute(move |conn| {
            let now = Utc::now().to_rfc3339();
            let tx = conn.transaction()?;
            let updated = tx.execute(
                "UPDATE templates SET name = ?1, updated_at = ?2 WHERE id = ?3",
                params![record.name, now, record.id],
            )?;
            if updated == 0 {
                tx.execute(
                    "INSERT INTO templates (id, name, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
                    params![record.id, record.name, now],
                )?;
            }
            write_exercises(&tx, &record.id, &record.exercises)?;
            tx.commit().with_context(|| "failed to commit template save")?;
            Ok(())
        })
        .await
    }
}
