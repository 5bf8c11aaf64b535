pub mod repository;

pub use repository::Storage;

use crate::domain::error::AppError;
use crate::domain::types::{NewWork, UserStyle, Work};

/// 作品・文体の永続化インターフェース。
///
/// 一覧は常に新しい順。所有者以外のレコードは存在しないものとして扱う。
pub trait Repository: Send + Sync {
    fn insert_style(
        &self,
        user_id: &str,
        style_name: &str,
        style_data: &serde_json::Value,
        now: &str,
    ) -> Result<UserStyle, AppError>;

    fn list_styles(&self, user_id: &str) -> Result<Vec<UserStyle>, AppError>;

    fn get_style(&self, user_id: &str, style_id: &str) -> Result<Option<UserStyle>, AppError>;

    /// 削除できたら true
    fn delete_style(&self, user_id: &str, style_id: &str) -> Result<bool, AppError>;

    fn insert_work(&self, work: &NewWork, now: &str) -> Result<Work, AppError>;

    fn list_works(&self, user_id: &str) -> Result<Vec<Work>, AppError>;

    fn get_work(&self, user_id: &str, work_id: &str) -> Result<Option<Work>, AppError>;

    /// お気に入りを指定値にする（後勝ち）
    fn set_favorite(
        &self,
        user_id: &str,
        work_id: &str,
        favorite: bool,
        now: &str,
    ) -> Result<Work, AppError>;

    /// お気に入りを反転する（1 トランザクションで読み書き）
    fn toggle_favorite(&self, user_id: &str, work_id: &str, now: &str) -> Result<Work, AppError>;
}
