//! Timeline: earlier related stories in the same category.

use calm_core::{
  store::{NewsStore, StoryOrder, StoryQuery},
  timeline::{self, Timeline},
};
use chrono::TimeDelta;
use uuid::Uuid;

use crate::{Engine, Error, Result, engine::window_start};

impl<S: NewsStore> Engine<S> {
  /// Related stories first seen in `[now - lookback_days, story.first_seen)`,
  /// newest first. `None` when the story does not exist.
  pub async fn build_timeline(
    &self,
    story_id: Uuid,
    lookback_days: Option<u32>,
  ) -> Result<Option<Timeline>> {
    let Some(story) = self.store.get_story(story_id).await.map_err(Error::store)? else {
      return Ok(None);
    };
    let days = lookback_days.unwrap_or(timeline::DEFAULT_LOOKBACK_DAYS);

    let query = StoryQuery {
      category: Some(story.category.clone()),
      first_seen_from: window_start(self.clock.now(), TimeDelta::try_days(i64::from(days))),
      first_seen_before: Some(story.first_seen),
      order: StoryOrder::Newest,
      ..Default::default()
    };
    let candidates = self
      .store
      .find_stories(&query)
      .await
      .map_err(Error::store)?;

    Ok(Some(timeline::assemble(&story, candidates, days)))
  }
}
