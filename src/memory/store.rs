//! JSON 文件持久化核心
//!
//! - 读取：文件不存在 → 空存储；文件无法解析 → 移到 `<path>.bak` 后从空存储开始
//! - 写入：同目录临时文件 → `flush` + `sync_all` → `rename` 覆盖目标文件
//!
//! 目标文件始终是上一次或本次完整写入的文档，并发读者不会读到半截内容。
//! 不持有跨进程锁，也不在进程内缓存：每次调用都重新读盘。

use super::record::{StoreDocument, StoreRecord};
use crate::error::{Result, StoreError};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};

const BACKUP_SUFFIX: &str = ".bak";

/// 读盘结果，不做任何恢复动作
#[derive(Debug)]
pub enum ReadOutcome<R> {
    Missing,
    Parsed(StoreDocument<R>),
    Corrupt(String),
}

/// 绑定到单个 JSON 文件的有界记录存储
#[derive(Debug, Clone)]
pub struct JsonStore<R> {
    path: PathBuf,
    _record: PhantomData<fn() -> R>,
}

impl<R: StoreRecord> JsonStore<R> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _record: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 损坏文件的备份路径，如 `used_facts.json.bak`
    pub fn backup_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(BACKUP_SUFFIX);
        PathBuf::from(name)
    }

    /// 读取存储；损坏的文件被备份后返回空存储，不视为错误
    pub fn load(&self) -> Result<StoreDocument<R>> {
        match self.read()? {
            ReadOutcome::Missing => {
                debug!(path = %self.path.display(), "存储文件不存在，从空存储开始");
                Ok(StoreDocument::default())
            }
            ReadOutcome::Parsed(doc) => {
                debug!(path = %self.path.display(), entries = doc.len(), "📂 存储已加载");
                Ok(doc)
            }
            ReadOutcome::Corrupt(reason) => {
                self.quarantine(&reason);
                Ok(StoreDocument::default())
            }
        }
    }

    /// 只读读取：损坏的文件按空存储处理，但不备份、不改动文件
    pub fn snapshot(&self) -> Result<StoreDocument<R>> {
        match self.read()? {
            ReadOutcome::Missing => Ok(StoreDocument::default()),
            ReadOutcome::Parsed(doc) => Ok(doc),
            ReadOutcome::Corrupt(reason) => {
                warn!(path = %self.path.display(), reason = %reason, "⚠️ 存储文件无法解析，按空存储读取");
                Ok(StoreDocument::default())
            }
        }
    }

    /// 原子写入完整文档
    ///
    /// 失败时临时文件被删除，目标文件保持原样，错误返回给调用方。
    pub fn save(&self, store: &StoreDocument<R>) -> Result<()> {
        let json = serde_json::to_string_pretty(store)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        write_atomic(&self.path, json.as_bytes(), |from, to| fs::rename(from, to)).map_err(
            |source| {
                error!(path = %self.path.display(), error = %source, "❌ 存储写入失败");
                StoreError::Write {
                    path: self.path.clone(),
                    source,
                }
            },
        )?;
        debug!(path = %self.path.display(), entries = store.len(), "💾 存储已持久化");
        Ok(())
    }

    /// 只读检查文件状态，供状态报告区分"不存在"与"已损坏"
    pub fn inspect(&self) -> Result<ReadOutcome<R>> {
        self.read()
    }

    fn read(&self) -> Result<ReadOutcome<R>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(ReadOutcome::Missing),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                }
                .into());
            }
        };
        Ok(match serde_json::from_slice::<StoreDocument<R>>(&bytes) {
            Ok(doc) => ReadOutcome::Parsed(doc),
            Err(e) => ReadOutcome::Corrupt(e.to_string()),
        })
    }

    /// 把无法解析的文件移到 `.bak`（覆盖旧备份）；改名失败时退回复制
    fn quarantine(&self, reason: &str) {
        let backup = self.backup_path();
        match fs::rename(&self.path, &backup) {
            Ok(()) => {
                warn!(
                    path = %self.path.display(),
                    backup = %backup.display(),
                    reason = %reason,
                    "⚠️ 存储文件损坏，已备份并重置"
                );
            }
            Err(rename_err) => match fs::copy(&self.path, &backup) {
                Ok(_) => warn!(
                    path = %self.path.display(),
                    backup = %backup.display(),
                    reason = %reason,
                    rename_error = %rename_err,
                    "⚠️ 存储文件损坏，已复制备份并重置"
                ),
                Err(copy_err) => error!(
                    path = %self.path.display(),
                    reason = %reason,
                    error = %copy_err,
                    "❌ 存储文件损坏且无法备份，从空存储开始"
                ),
            },
        }
    }
}

/// 写临时文件再替换目标文件；`replace` 单独传入以便注入故障
fn write_atomic(
    path: &Path,
    bytes: &[u8],
    replace: impl FnOnce(&Path, &Path) -> io::Result<()>,
) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir)?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "store".to_string());
    let tmp_path = dir.join(format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4().simple()));

    let result = write_temp(&tmp_path, bytes).and_then(|()| replace(&tmp_path, path));
    if let Err(e) = result {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }

    sync_dir(&dir);
    Ok(())
}

fn write_temp(tmp_path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(tmp_path)?;
    file.write_all(bytes)?;
    file.flush()?;
    file.sync_all()
}

/// 目录项落盘，使 rename 本身持久化；尽力而为
#[cfg(unix)]
fn sync_dir(dir: &Path) {
    if let Err(e) = fs::File::open(dir).and_then(|d| d.sync_all()) {
        debug!(dir = %dir.display(), error = %e, "目录 fsync 失败");
    }
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) {}
