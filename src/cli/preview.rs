//! Preview command handler.

use color_eyre::Result;

use crate::config::Config;
use crate::context::Context;
use crate::error::AppError;
use crate::models::{CompositeKey, CourseProgress};
use crate::repositories::ProgressRepository;
use crate::services::merge_course_progress;

use super::App;

impl App {
    /// Print the merged record one pair would receive, without writing it.
    pub async fn run_preview(&self, user: &str, course: &str) -> Result<()> {
        let config = Config::load()?;
        let ctx = Context::from(config).await?;
        let key = CompositeKey::new(user, course);

        let progress = preview(&ctx, &key).await?;
        println!("{}", serde_json::to_string_pretty(&progress)?);
        Ok(())
    }
}

/// Computes the merged record for one pair from the live source collections.
pub async fn preview(ctx: &Context, key: &CompositeKey) -> Result<CourseProgress, AppError> {
    let repo = ProgressRepository::new(ctx.store.as_ref(), &ctx.config.migration);

    let legacy = repo
        .find_legacy_progress(key)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("legacy progress for {}", key)))?;
    let entries = repo.find_tracking_entries(key).await?;

    tracing::debug!(key = %key, tracking_rows = entries.len(), "Previewing course progress");
    Ok(merge_course_progress(&legacy, &entries))
}
