//! Styleable コア: 文体抽出 → 仿写生成 → 人味改写 のパイプラインと、
//! AI 生成テキスト判定をまとめたライブラリ。
//!
//! - `domain`: 状態機械・データモデル・エラー
//! - `infra`: LLM クライアント、プロンプト、応答抽出、SQLite ストレージ
//! - `usecase`: パイプライン各ステージとアプリケーションサービス

pub mod domain;
pub mod infra;
pub mod usecase;
