//! Clustering: assigning each article to an existing story or a new one.

use calm_core::{
  article::{Article, NewArticle},
  ranking,
  similarity::title_similarity,
  source::Source,
  store::{NewsStore, StoryOrder, StoryQuery},
  story::{Story, StorySource, StoryStats},
};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Engine, Error, Result, engine::window_start, stories::Edit};

/// What happened to one article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Assignment {
  /// The article became the primary source of a new story.
  Created { story_id: Uuid },
  /// The article joined an existing story.
  Matched { story_id: Uuid, similarity: f64 },
  /// The article was already part of a story; nothing changed.
  AlreadyLinked { story_id: Uuid },
  /// The matched story already has this outlet; the article was not linked.
  DuplicateSource { story_id: Uuid, source: String },
}

impl Assignment {
  pub fn story_id(&self) -> Uuid {
    match self {
      Self::Created { story_id }
      | Self::Matched { story_id, .. }
      | Self::AlreadyLinked { story_id }
      | Self::DuplicateSource { story_id, .. } => *story_id,
    }
  }
}

/// Totals for one clustering batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterReport {
  pub new_stories:     usize,
  pub merged_articles: usize,
  pub skipped:         usize,
  pub errors:          usize,
}

/// Whether a story's recorded count still agrees with its links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryAudit {
  pub story_id:              Uuid,
  pub recorded_source_count: u32,
  pub linked_sources:        u32,
  pub drift:                 bool,
}

/// The best-matching candidate: highest similarity, then the most recently
/// first seen, then the lowest id.
fn best_match<'a>(title: &str, candidates: &'a [Story]) -> Option<(&'a Story, f64)> {
  candidates
    .iter()
    .map(|story| (story, title_similarity(title, &story.canonical_title)))
    .max_by(|(a, sim_a), (b, sim_b)| {
      sim_a
        .total_cmp(sim_b)
        .then_with(|| a.first_seen.cmp(&b.first_seen))
        .then_with(|| b.story_id.cmp(&a.story_id))
    })
}

impl<S: NewsStore> Engine<S> {
  /// Ingest and assign a batch of articles.
  ///
  /// Articles are handled one at a time; a failure is logged and counted and
  /// does not stop the batch.
  pub async fn cluster_articles(&self, articles: Vec<NewArticle>) -> ClusterReport {
    let mut report = ClusterReport::default();

    for input in articles {
      let url = input.url.clone();
      match self.ingest(input).await {
        Ok(Assignment::Created { .. }) => report.new_stories += 1,
        Ok(Assignment::Matched { .. }) => report.merged_articles += 1,
        Ok(Assignment::AlreadyLinked { .. } | Assignment::DuplicateSource { .. }) => {
          report.skipped += 1
        }
        Err(e) => {
          tracing::warn!(%url, error = %e, "failed to cluster article");
          report.errors += 1;
        }
      }
    }

    tracing::info!(
      new_stories = report.new_stories,
      merged = report.merged_articles,
      skipped = report.skipped,
      errors = report.errors,
      "clustering batch complete"
    );
    report
  }

  /// Store one raw article and assign it.
  pub async fn ingest(&self, input: NewArticle) -> Result<Assignment> {
    let input = input.normalized()?;
    let article = self
      .store
      .record_article(input)
      .await
      .map_err(Error::store)?;
    self.assign(&article).await
  }

  /// Place a stored article into the best-matching recent story in its
  /// category, or start a new story with it.
  ///
  /// Re-assigning an article that is already linked changes nothing.
  pub async fn assign(&self, article: &Article) -> Result<Assignment> {
    if let Some(link) = self
      .store
      .link_for_article(article.article_id)
      .await
      .map_err(Error::store)?
    {
      return Ok(Assignment::AlreadyLinked {
        story_id: link.story_id,
      });
    }

    let source = self.registry.get_or_create(&article.source).await?;
    let now = self.clock.now();

    let settings = &self.settings.cluster;
    let query = StoryQuery {
      category: Some(article.category.clone()),
      first_seen_from: window_start(now, TimeDelta::try_hours(settings.candidate_window_hours)),
      order: StoryOrder::Newest,
      ..Default::default()
    };
    let candidates = self
      .store
      .find_stories(&query)
      .await
      .map_err(Error::store)?;

    match best_match(&article.title, &candidates) {
      Some((story, similarity)) if similarity > settings.similarity_threshold => {
        tracing::debug!(
          story_id = %story.story_id,
          similarity,
          title = %article.title,
          "article matched existing story"
        );
        self
          .add_article_to_story(story.story_id, article, similarity)
          .await
      }
      _ => self.create_story(article, &source, now).await,
    }
  }

  /// Start a story with `article` as its primary source. If the article was
  /// linked elsewhere in the meantime, nothing is written and that link wins.
  pub(crate) async fn create_story(
    &self,
    article: &Article,
    source: &Source,
    now: DateTime<Utc>,
  ) -> Result<Assignment> {
    let credibility = source.credibility_score;
    let story = Story::from_primary(article, credibility, now);
    let story_id = story.story_id;
    let primary = StorySource::primary(story_id, article, credibility, now);

    if let Some(story) = self
      .store
      .insert_story(story, primary)
      .await
      .map_err(Error::store)?
    {
      tracing::info!(%story_id, title = %story.canonical_title, "created story");
      return Ok(Assignment::Created { story_id });
    }

    let link = self
      .store
      .link_for_article(article.article_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::Conflict {
        story_id,
        attempts: 1,
      })?;
    tracing::debug!(
      story_id = %link.story_id,
      article_id = %article.article_id,
      "article was linked elsewhere while its story was created"
    );
    Ok(Assignment::AlreadyLinked {
      story_id: link.story_id,
    })
  }

  /// Link `article` into an existing story and recompute the story's
  /// aggregates and score.
  ///
  /// A story holds at most one article per outlet; a second one is skipped.
  pub async fn add_article_to_story(
    &self,
    story_id: Uuid,
    article: &Article,
    similarity: f64,
  ) -> Result<Assignment> {
    if self
      .store
      .get_story(story_id)
      .await
      .map_err(Error::store)?
      .is_none()
    {
      return Err(Error::StoryNotFound(story_id));
    }

    let credibility = self.registry.get_credibility(&article.source).await?;
    let link = StorySource::secondary(story_id, article, credibility, similarity, self.clock.now());
    if !self.store.link_source(link).await.map_err(Error::store)? {
      tracing::debug!(%story_id, source = %article.source, "source already linked; skipping");
      return Ok(Assignment::DuplicateSource {
        story_id,
        source: article.source.clone(),
      });
    }

    self.recompute_aggregates(story_id).await?;
    Ok(Assignment::Matched {
      story_id,
      similarity,
    })
  }

  /// Re-scan a story's links and rewrite its count, diversity, credibility
  /// and score, retrying on concurrent writes.
  async fn recompute_aggregates(&self, story_id: Uuid) -> Result<Story> {
    let edit = self
      .edit_story_with_links(story_id, |story, links| {
        let now = self.clock.now();
        StoryStats::from_links(links, self.policy()).apply_to(story);
        story.last_updated = now;
        story.importance_score = ranking::score(story, now);
        true
      })
      .await?;

    match edit {
      Edit::Written(story) | Edit::Unchanged(story) => Ok(story),
      Edit::Missing => Err(Error::StoryNotFound(story_id)),
    }
  }

  /// Compare a story's recorded source count with its actual links.
  ///
  /// Read-only; drift is reported, not repaired.
  pub async fn audit_story(&self, story_id: Uuid) -> Result<Option<StoryAudit>> {
    let Some(story) = self.store.get_story(story_id).await.map_err(Error::store)? else {
      return Ok(None);
    };
    let links = self
      .store
      .story_sources(story_id)
      .await
      .map_err(Error::store)?;

    let linked_sources = links.len() as u32;
    let drift = linked_sources != story.source_count;
    if drift {
      tracing::warn!(
        %story_id,
        recorded = story.source_count,
        linked = linked_sources,
        "story source count drifted from its links"
      );
    }
    Ok(Some(StoryAudit {
      story_id,
      recorded_source_count: story.source_count,
      linked_sources,
      drift,
    }))
  }
}
