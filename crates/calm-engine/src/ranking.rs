//! Ranking: periodic score refresh and the paginated ranked feed.

use calm_core::{
  ranking::{self, Explanation},
  store::{NewsStore, StoryOrder, StoryQuery},
  story::Story,
};
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Engine, Error, Result, engine::window_start, stories::Edit};

/// Totals for one [`Engine::refresh_all`] pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshReport {
  pub scanned: usize,
  pub updated: usize,
  /// Stories whose write kept losing to concurrent writers, or failed.
  pub failed:  usize,
}

/// Parameters of the ranked feed. Unset fields take the configured defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RankedQuery {
  /// 1-based; `0` is treated as the first page.
  pub page:          Option<usize>,
  pub limit:         Option<usize>,
  /// Matched case-insensitively.
  pub category:      Option<String>,
  pub mood:          Option<String>,
  pub max_age_hours: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
  pub page:        usize,
  pub limit:       usize,
  pub total:       u64,
  pub total_pages: u64,
  pub has_more:    bool,
}

impl Pagination {
  fn new(page: usize, limit: usize, total: u64) -> Self {
    let total_pages = total.div_ceil(limit as u64);
    Self {
      page,
      limit,
      total,
      total_pages,
      has_more: (page as u64) < total_pages,
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedPage {
  pub stories:    Vec<Story>,
  pub pagination: Pagination,
}

impl<S: NewsStore> Engine<S> {
  /// Recompute the score of every story first seen within `max_age_hours`
  /// (the configured window when `None`) and persist the ones that moved by
  /// more than the configured delta.
  pub async fn refresh_all(&self, max_age_hours: Option<u32>) -> Result<RefreshReport> {
    let settings = &self.settings.ranking;
    let hours = max_age_hours.unwrap_or(settings.max_age_hours);
    let now = self.clock.now();

    let query = StoryQuery {
      first_seen_from: window_start(now, TimeDelta::try_hours(i64::from(hours))),
      order: StoryOrder::Newest,
      ..Default::default()
    };
    let stories = self
      .store
      .find_stories(&query)
      .await
      .map_err(Error::store)?;

    let mut report = RefreshReport {
      scanned: stories.len(),
      ..Default::default()
    };
    for story in stories {
      let story_id = story.story_id;
      let outcome = self
        .edit_story(story_id, |story| {
          let fresh = ranking::score(story, now);
          if (fresh - story.importance_score).abs() <= settings.min_score_delta {
            return false;
          }
          story.importance_score = fresh;
          true
        })
        .await;

      match outcome {
        Ok(Edit::Written(_)) => report.updated += 1,
        Ok(Edit::Unchanged(_) | Edit::Missing) => {}
        Err(e) => {
          tracing::warn!(%story_id, error = %e, "failed to refresh story score");
          report.failed += 1;
        }
      }
    }

    tracing::info!(
      scanned = report.scanned,
      updated = report.updated,
      failed = report.failed,
      "refreshed importance scores"
    );
    Ok(report)
  }

  /// One page of stories ordered by importance, then recency.
  pub async fn get_ranked(&self, params: RankedQuery) -> Result<RankedPage> {
    let settings = &self.settings.ranking;
    let page = params.page.unwrap_or(1).max(1);
    let limit = params
      .limit
      .unwrap_or(settings.default_page_size)
      .clamp(1, settings.max_page_size.max(1));
    let hours = params.max_age_hours.unwrap_or(settings.max_age_hours);

    let category = params
      .category
      .map(|c| c.trim().to_ascii_lowercase())
      .filter(|c| !c.is_empty());

    let query = StoryQuery {
      category,
      mood: params.mood,
      first_seen_from: window_start(self.clock.now(), TimeDelta::try_hours(i64::from(hours))),
      order: StoryOrder::Importance,
      limit: Some(limit),
      offset: Some((page - 1).saturating_mul(limit)),
      ..Default::default()
    };

    let total = self
      .store
      .count_stories(&query)
      .await
      .map_err(Error::store)?;
    let stories = self
      .store
      .find_stories(&query)
      .await
      .map_err(Error::store)?;

    Ok(RankedPage {
      stories,
      pagination: Pagination::new(page, limit, total),
    })
  }

  /// Score breakdown and human-readable tags for one story, as of now.
  pub async fn explain(&self, story_id: Uuid) -> Result<Option<Explanation>> {
    let story = self.store.get_story(story_id).await.map_err(Error::store)?;
    Ok(story.map(|story| ranking::explain(&story, self.clock.now())))
  }
}
