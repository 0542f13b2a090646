use std::{
    future::Future,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, bail, Result};
use chrono::{NaiveDate, NaiveTime};
use fs4::tokio::AsyncFileExt;
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt},
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::utils::time::{date_to_record, parse_clock_time, record_to_date};

use super::entities::{Priority, RecurrenceKind, RecurrencePattern, TaskEntity};

const TASKS_FILE: &str = "tasks.jsonl";

/// Interface for abstracting persistence of the task collection.
pub trait TaskStorage {
    /// Reads every task that can be read. Unreadable records are skipped.
    fn load_all(&self) -> impl Future<Output = Result<Vec<TaskEntity>>> + Send;

    /// Reads the collection, lets `change` modify it and writes it back, all under one exclusive
    /// lock. Nothing is written if `change` fails. Records that couldn't be read are written back
    /// untouched.
    fn transaction<R, F>(&self, change: F) -> impl Future<Output = Result<R>> + Send
    where
        R: Send,
        F: FnOnce(&mut Vec<TaskEntity>) -> Result<R> + Send;
}

/// Content of the tasks file split into readable tasks and the raw lines that weren't.
#[derive(Debug, Default)]
struct TaskFile {
    tasks: Vec<TaskEntity>,
    unreadable: Vec<String>,
}

impl TaskFile {
    fn parse(content: &str, path: &Path) -> Self {
        let mut file = Self::default();
        for line in content.lines() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<TaskEntity>(line) {
                Ok(v) => file.tasks.push(v),
                Err(e) => {
                    warn!("Found illegal task record in {path:?} {line}: {e}");
                    file.unreadable.push(line.to_string());
                }
            }
        }
        file
    }

    fn encode(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::<u8>::new();
        for task in &self.tasks {
            serde_json::to_writer(&mut buffer, task)?;
            buffer.push(b'\n');
        }
        for line in &self.unreadable {
            buffer.extend_from_slice(line.as_bytes());
            buffer.push(b'\n');
        }
        Ok(buffer)
    }
}

/// The main realization of [TaskStorage]. Tasks live in a single file, one JSON document per
/// line.
pub struct TaskStorageImpl {
    path: PathBuf,
}

impl TaskStorageImpl {
    pub fn new(data_dir: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&data_dir)?;

        Ok(Self {
            path: data_dir.join(TASKS_FILE),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

async fn read_content(file: &mut File) -> std::result::Result<String, std::io::Error> {
    let mut content = String::new();
    file.read_to_string(&mut content).await?;
    Ok(content)
}

/// Runs `change` over the content of an already locked file and replaces the content with the
/// result.
async fn rewrite<R>(
    file: &mut File,
    path: &Path,
    change: impl FnOnce(&mut Vec<TaskEntity>) -> Result<R>,
) -> Result<R> {
    let mut content = TaskFile::parse(&read_content(file).await?, path);
    let result = change(&mut content.tasks)?;
    let buffer = content.encode()?;

    file.set_len(0).await?;
    file.rewind().await?;
    file.write_all(&buffer).await?;
    file.flush().await?;
    file.sync_data().await?;
    debug!(
        "Saved {} tasks and {} unreadable records into {path:?}",
        content.tasks.len(),
        content.unreadable.len()
    );
    Ok(result)
}

impl TaskStorage for TaskStorageImpl {
    async fn load_all(&self) -> Result<Vec<TaskEntity>> {
        async fn extract(path: &Path) -> std::result::Result<String, std::io::Error> {
            debug!("Extracting {path:?}");
            let mut file = File::open(path).await?;
            file.lock_shared()?;
            let content = read_content(&mut file).await;
            file.unlock_async().await?;
            content
        }

        match extract(&self.path).await {
            Ok(content) => Ok(TaskFile::parse(&content, &self.path).tasks),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(vec![]),
            Err(e) => Err(e)?,
        }
    }

    async fn transaction<R, F>(&self, change: F) -> Result<R>
    where
        R: Send,
        F: FnOnce(&mut Vec<TaskEntity>) -> Result<R> + Send,
    {
        let mut file = File::options()
            .write(true)
            .create(true)
            .read(true)
            .truncate(false)
            .open(&self.path)
            .await?;

        // Held from the read until the write so concurrent processes can't interleave
        file.lock_exclusive()?;
        let result = rewrite(&mut file, &self.path, change).await;
        file.unlock_async().await?;
        result
    }
}

/// Fields of a task that is about to be created.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub recurrence: Option<RecurrencePattern>,
    pub priority: Priority,
    pub category: String,
    pub description: String,
    pub duration: Option<u32>,
}

/// Partial update. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<Option<NaiveTime>>,
    pub recurrence: Option<Option<RecurrencePattern>>,
    pub priority: Option<Priority>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub duration: Option<Option<u32>>,
}

impl TaskUpdate {
    fn apply(self, task: &mut TaskEntity) {
        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(date) = self.date {
            task.date = date_to_record(date);
        }
        if let Some(time) = self.time {
            task.time = time_to_record(time);
        }
        if let Some(recurrence) = self.recurrence {
            task.recurrence = recurrence;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(category) = self.category {
            task.category = category;
        }
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(duration) = self.duration {
            task.duration = duration;
        }
    }
}

fn time_to_record(time: Option<NaiveTime>) -> String {
    time.map(|v| v.format("%H:%M").to_string()).unwrap_or_default()
}

/// Owns the task collection. Every mutation is a single [TaskStorage::transaction], so
/// mutations never interleave, even across processes.
pub struct TaskStore<S: TaskStorage> {
    storage: S,
}

impl<S: TaskStorage> TaskStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub async fn list(&self) -> Result<Vec<TaskEntity>> {
        self.storage.load_all().await
    }

    pub async fn get(&self, id: Uuid) -> Result<TaskEntity> {
        self.list()
            .await?
            .into_iter()
            .find(|v| v.id == id)
            .ok_or_else(|| anyhow!("Task {id} doesn't exist"))
    }

    pub async fn create(&self, new_task: NewTask) -> Result<TaskEntity> {
        let task = TaskEntity {
            id: Uuid::new_v4(),
            title: new_task.title,
            date: date_to_record(new_task.date),
            time: time_to_record(new_task.time),
            recurrence: new_task.recurrence,
            priority: new_task.priority,
            category: new_task.category,
            completed: false,
            description: new_task.description,
            duration: new_task.duration,
        };
        validate_task(&task)?;

        let created = task.clone();
        self.storage
            .transaction(move |tasks| {
                tasks.push(task);
                Ok(())
            })
            .await?;
        info!("Created task {}", created.id);
        Ok(created)
    }

    pub async fn update(&self, id: Uuid, update: TaskUpdate) -> Result<TaskEntity> {
        self.modify(id, |task| {
            update.apply(task);
            validate_task(task)
        })
        .await
    }

    pub async fn toggle_complete(&self, id: Uuid) -> Result<TaskEntity> {
        self.modify(id, |task| {
            task.completed = !task.completed;
            Ok(())
        })
        .await
    }

    /// Removes the task and returns what was removed.
    pub async fn delete(&self, id: Uuid) -> Result<TaskEntity> {
        let removed = self
            .storage
            .transaction(|tasks| {
                let Some(index) = tasks.iter().position(|v| v.id == id) else {
                    bail!("Task {id} doesn't exist");
                };
                Ok(tasks.remove(index))
            })
            .await?;
        info!("Deleted task {id}");
        Ok(removed)
    }

    async fn modify(
        &self,
        id: Uuid,
        change: impl FnOnce(&mut TaskEntity) -> Result<()> + Send,
    ) -> Result<TaskEntity> {
        let updated = self
            .storage
            .transaction(|tasks| {
                let Some(task) = tasks.iter_mut().find(|v| v.id == id) else {
                    bail!("Task {id} doesn't exist");
                };
                change(task)?;
                Ok(task.clone())
            })
            .await?;
        info!("Updated task {id}");
        Ok(updated)
    }
}

/// Checks a task before it's written. Readers tolerate bad records, writers don't produce them.
pub fn validate_task(task: &TaskEntity) -> Result<()> {
    if task.title.trim().is_empty() {
        bail!("Task title can't be empty");
    }
    let anchor = record_to_date(&task.date)?;
    parse_clock_time(&task.time)?;

    let Some(pattern) = &task.recurrence else {
        return Ok(());
    };
    if pattern.interval < 1 {
        bail!(
            "Recurrence interval has to be at least 1, got {}",
            pattern.interval
        );
    }
    if let Some(invalid) = pattern
        .days_of_week
        .iter()
        .flatten()
        .find(|v| !(0..7).contains(*v))
    {
        bail!("Weekday index {invalid} is outside 0 (Sunday) to 6 (Saturday)");
    }
    if let Some(end_date) = &pattern.end_date {
        let end_date = record_to_date(end_date)?;
        if end_date < anchor {
            bail!("Recurrence ends on {end_date} which is before its start {anchor}");
        }
    }
    match pattern.kind {
        RecurrenceKind::Custom => {
            warn!(
                "Task {} uses custom recurrence which is not supported and will never be shown",
                task.id
            )
        }
        RecurrenceKind::Unknown => bail!("Unknown recurrence type"),
        RecurrenceKind::None
        | RecurrenceKind::Daily
        | RecurrenceKind::Weekly
        | RecurrenceKind::Monthly => {}
    }
    Ok(())
}
