//! Story reads and the optimistic write loop shared by the other services.

use calm_core::{
  store::{CategoryCount, NewsStore},
  story::{Enrichment, Story, StoryDetail, StorySource},
};
use chrono::{DateTime, TimeDelta, Utc};
use uuid::Uuid;

use crate::{Engine, Error, Result, engine::window_start};

/// Outcome of [`Engine::edit_story`].
#[derive(Debug)]
pub(crate) enum Edit {
  Written(Story),
  Unchanged(Story),
  Missing,
}

impl<S: NewsStore> Engine<S> {
  /// Load, edit and compare-and-swap a story until the write lands.
  ///
  /// `edit` is re-run on a fresh copy after every lost race and returns
  /// whether the story needs writing at all.
  pub(crate) async fn edit_story<F>(&self, story_id: Uuid, mut edit: F) -> Result<Edit>
  where
    F: FnMut(&mut Story) -> bool,
  {
    self
      .write_loop(story_id, false, |story, _| edit(story))
      .await
  }

  /// [`Engine::edit_story`], with the story's links re-read alongside it on
  /// every attempt.
  pub(crate) async fn edit_story_with_links<F>(&self, story_id: Uuid, edit: F) -> Result<Edit>
  where
    F: FnMut(&mut Story, &[StorySource]) -> bool,
  {
    self.write_loop(story_id, true, edit).await
  }

  async fn write_loop<F>(&self, story_id: Uuid, with_links: bool, mut edit: F) -> Result<Edit>
  where
    F: FnMut(&mut Story, &[StorySource]) -> bool,
  {
    let attempts = self.settings.cluster.max_write_attempts.max(1);
    for attempt in 1..=attempts {
      let Some(mut story) = self.store.get_story(story_id).await.map_err(Error::store)?
      else {
        return Ok(Edit::Missing);
      };
      let links = if with_links {
        self
          .store
          .story_sources(story_id)
          .await
          .map_err(Error::store)?
      } else {
        Vec::new()
      };
      if !edit(&mut story, &links) {
        return Ok(Edit::Unchanged(story));
      }

      let expected = story.version;
      match self
        .store
        .update_story(story, expected)
        .await
        .map_err(Error::store)?
      {
        Some(written) => return Ok(Edit::Written(written)),
        None => tracing::debug!(%story_id, attempt, "story changed underneath; retrying"),
      }
    }
    Err(Error::Conflict { story_id, attempts })
  }

  /// A story with its links, primary first.
  pub async fn get_story(&self, story_id: Uuid) -> Result<Option<StoryDetail>> {
    let Some(story) = self.store.get_story(story_id).await.map_err(Error::store)? else {
      return Ok(None);
    };
    let sources = self
      .store
      .story_sources(story_id)
      .await
      .map_err(Error::store)?;
    Ok(Some(StoryDetail { story, sources }))
  }

  /// Store annotations from the enrichment service. Fields absent from
  /// `enrichment` keep their current values.
  pub async fn apply_enrichment(
    &self,
    story_id: Uuid,
    enrichment: Enrichment,
  ) -> Result<Option<Story>> {
    let edit = self
      .edit_story(story_id, |story| {
        story.apply_enrichment(enrichment.clone());
        true
      })
      .await?;

    match edit {
      Edit::Written(story) | Edit::Unchanged(story) => {
        tracing::info!(%story_id, version = story.version, "applied enrichment");
        Ok(Some(story))
      }
      Edit::Missing => Ok(None),
    }
  }

  /// Story counts per category over the last `max_age_hours` (the ranking
  /// window when `None`).
  pub async fn category_counts(&self, max_age_hours: Option<u32>) -> Result<Vec<CategoryCount>> {
    let hours = max_age_hours.unwrap_or(self.settings.ranking.max_age_hours);
    let since = window_start(self.clock.now(), TimeDelta::try_hours(i64::from(hours)))
      .unwrap_or(DateTime::<Utc>::MIN_UTC);
    self
      .store
      .count_by_category(since)
      .await
      .map_err(Error::store)
  }
}
