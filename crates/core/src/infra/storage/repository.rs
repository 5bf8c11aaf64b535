use std::path::Path;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};

use super::Repository;
use crate::domain::error::AppError;
use crate::domain::types::{NewWork, UserStyle, Work};

/// SQLiteストレージ（user_styles + works）
pub struct Storage {
    conn: Mutex<Connection>,
}

const WORK_COLUMNS: &str = "id, user_id, title, keywords, original_text, mimic_text, \
     humanized_text, favorite, style_id, created_at, updated_at";

impl Storage {
    /// 新規接続（ファイルパス指定）。親ディレクトリがなければ作る
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| AppError::storage(format!("DBディレクトリ作成に失敗: {e}")))?;
        }
        let conn = Connection::open(path)
            .map_err(|e| AppError::storage(format!("DB接続に失敗: {e}")))?;
        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.migrate()?;
        Ok(storage)
    }

    /// in-memory DB（テスト用）
    pub fn open_in_memory() -> Result<Self, AppError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| AppError::storage(format!("in-memory DB作成に失敗: {e}")))?;
        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.migrate()?;
        Ok(storage)
    }

    /// スキーママイグレーション
    fn migrate(&self) -> Result<(), AppError> {
        self.conn
            .lock()
            .execute_batch(
                "
                CREATE TABLE IF NOT EXISTS user_styles (
                    id         TEXT PRIMARY KEY,
                    user_id    TEXT NOT NULL,
                    style_name TEXT NOT NULL,
                    style_data TEXT NOT NULL,
                    created_at TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_styles_user
                    ON user_styles(user_id, created_at DESC);

                CREATE TABLE IF NOT EXISTS works (
                    id             TEXT PRIMARY KEY,
                    user_id        TEXT NOT NULL,
                    title          TEXT NOT NULL,
                    keywords       TEXT NOT NULL DEFAULT '',
                    original_text  TEXT NOT NULL DEFAULT '',
                    mimic_text     TEXT NOT NULL DEFAULT '',
                    humanized_text TEXT NOT NULL DEFAULT '',
                    favorite       INTEGER NOT NULL DEFAULT 0,
                    style_id       TEXT,
                    created_at     TEXT NOT NULL,
                    updated_at     TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_works_user
                    ON works(user_id, created_at DESC);
                ",
            )
            .map_err(|e| AppError::storage(format!("マイグレーション失敗: {e}")))?;
        Ok(())
    }

    fn map_style_row(row: &rusqlite::Row) -> rusqlite::Result<UserStyle> {
        let raw: String = row.get(3)?;
        // 壊れた JSON は文字列のまま返す
        let style_data =
            serde_json::from_str(&raw).unwrap_or_else(|_| serde_json::Value::String(raw));
        Ok(UserStyle {
            id: row.get(0)?,
            user_id: row.get(1)?,
            style_name: row.get(2)?,
            style_data,
            created_at: row.get(4)?,
        })
    }

    fn map_work_row(row: &rusqlite::Row) -> rusqlite::Result<Work> {
        Ok(Work {
            id: row.get(0)?,
            user_id: row.get(1)?,
            title: row.get(2)?,
            keywords: row.get(3)?,
            original_text: row.get(4)?,
            mimic_text: row.get(5)?,
            humanized_text: row.get(6)?,
            favorite: row.get::<_, i32>(7)? != 0,
            style_id: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }

    fn query_work(
        conn: &Connection,
        user_id: &str,
        work_id: &str,
    ) -> Result<Option<Work>, AppError> {
        conn.query_row(
            &format!("SELECT {WORK_COLUMNS} FROM works WHERE id = ?1 AND user_id = ?2"),
            params![work_id, user_id],
            Self::map_work_row,
        )
        .optional()
        .map_err(|e| AppError::storage(format!("作品取得失敗: {e}")))
    }
}

fn work_not_found(work_id: &str) -> AppError {
    AppError::not_found(format!("作品が見つかりません: {work_id}"))
}

impl Repository for Storage {
    // --- Styles ---

    fn insert_style(
        &self,
        user_id: &str,
        style_name: &str,
        style_data: &serde_json::Value,
        now: &str,
    ) -> Result<UserStyle, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        self.conn
            .lock()
            .execute(
                "INSERT INTO user_styles (id, user_id, style_name, style_data, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, user_id, style_name, style_data.to_string(), now],
            )
            .map_err(|e| AppError::storage(format!("文体保存失敗: {e}")))?;

        Ok(UserStyle {
            id,
            user_id: user_id.to_string(),
            style_name: style_name.to_string(),
            style_data: style_data.clone(),
            created_at: now.to_string(),
        })
    }

    fn list_styles(&self, user_id: &str) -> Result<Vec<UserStyle>, AppError> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT id, user_id, style_name, style_data, created_at
                 FROM user_styles WHERE user_id = ?1
                 ORDER BY created_at DESC, rowid DESC",
            )
            .map_err(|e| AppError::storage(format!("文体一覧クエリ失敗: {e}")))?;

        let rows = stmt
            .query_map(params![user_id], Self::map_style_row)
            .map_err(|e| AppError::storage(format!("文体一覧取得失敗: {e}")))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| AppError::storage(format!("文体行読み取り失敗: {e}")))?;
        Ok(rows)
    }

    fn get_style(&self, user_id: &str, style_id: &str) -> Result<Option<UserStyle>, AppError> {
        self.conn
            .lock()
            .query_row(
                "SELECT id, user_id, style_name, style_data, created_at
                 FROM user_styles WHERE id = ?1 AND user_id = ?2",
                params![style_id, user_id],
                Self::map_style_row,
            )
            .optional()
            .map_err(|e| AppError::storage(format!("文体取得失敗: {e}")))
    }

    fn delete_style(&self, user_id: &str, style_id: &str) -> Result<bool, AppError> {
        let affected = self
            .conn
            .lock()
            .execute(
                "DELETE FROM user_styles WHERE id = ?1 AND user_id = ?2",
                params![style_id, user_id],
            )
            .map_err(|e| AppError::storage(format!("文体削除失敗: {e}")))?;
        Ok(affected > 0)
    }

    // --- Works ---

    fn insert_work(&self, work: &NewWork, now: &str) -> Result<Work, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        self.conn
            .lock()
            .execute(
                "INSERT INTO works (id, user_id, title, keywords, original_text, mimic_text,
                                    humanized_text, favorite, style_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8, ?9, ?9)",
                params![
                    id,
                    work.user_id,
                    work.title,
                    work.keywords,
                    work.original_text,
                    work.mimic_text,
                    work.humanized_text,
                    work.style_id,
                    now
                ],
            )
            .map_err(|e| AppError::storage(format!("作品保存失敗: {e}")))?;

        Ok(Work {
            id,
            user_id: work.user_id.clone(),
            title: work.title.clone(),
            keywords: work.keywords.clone(),
            original_text: work.original_text.clone(),
            mimic_text: work.mimic_text.clone(),
            humanized_text: work.humanized_text.clone(),
            favorite: false,
            style_id: work.style_id.clone(),
            created_at: now.to_string(),
            updated_at: now.to_string(),
        })
    }

    fn list_works(&self, user_id: &str) -> Result<Vec<Work>, AppError> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {WORK_COLUMNS} FROM works WHERE user_id = ?1
                 ORDER BY created_at DESC, rowid DESC"
            ))
            .map_err(|e| AppError::storage(format!("作品一覧クエリ失敗: {e}")))?;

        let rows = stmt
            .query_map(params![user_id], Self::map_work_row)
            .map_err(|e| AppError::storage(format!("作品一覧取得失敗: {e}")))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| AppError::storage(format!("作品行読み取り失敗: {e}")))?;
        Ok(rows)
    }

    fn get_work(&self, user_id: &str, work_id: &str) -> Result<Option<Work>, AppError> {
        Self::query_work(&self.conn.lock(), user_id, work_id)
    }

    fn set_favorite(
        &self,
        user_id: &str,
        work_id: &str,
        favorite: bool,
        now: &str,
    ) -> Result<Work, AppError> {
        let conn = self.conn.lock();
        let affected = conn
            .execute(
                "UPDATE works SET favorite = ?1, updated_at = ?2 WHERE id = ?3 AND user_id = ?4",
                params![favorite as i32, now, work_id, user_id],
            )
            .map_err(|e| AppError::storage(format!("お気に入り更新失敗: {e}")))?;
        if affected == 0 {
            return Err(work_not_found(work_id));
        }
        Self::query_work(&conn, user_id, work_id)?.ok_or_else(|| work_not_found(work_id))
    }

    fn toggle_favorite(&self, user_id: &str, work_id: &str, now: &str) -> Result<Work, AppError> {
        let mut conn = self.conn.lock();
        let tx = conn
            .transaction()
            .map_err(|e| AppError::storage(format!("トランザクション開始失敗: {e}")))?;

        let current = Self::query_work(&tx, user_id, work_id)?.ok_or_else(|| work_not_found(work_id))?;
        let favorite = !current.favorite;

        tx.execute(
            "UPDATE works SET favorite = ?1, updated_at = ?2 WHERE id = ?3 AND user_id = ?4",
            params![favorite as i32, now, work_id, user_id],
        )
        .map_err(|e| AppError::storage(format!("お気に入り更新失敗: {e}")))?;

        tx.commit()
            .map_err(|e| AppError::storage(format!("コミット失敗: {e}")))?;

        Ok(Work {
            favorite,
            updated_at: now.to_string(),
            ..current
        })
    }
}
