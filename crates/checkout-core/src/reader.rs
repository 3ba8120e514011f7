//! Chapter navigation for the documentation reader.

use checkout_config::{ChapterConfig, ReaderConfig};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReaderError {
	#[error("Reader needs at least one chapter")]
	Empty,
	#[error("Unknown chapter: '{0}'")]
	UnknownChapter(String),
}

/// A chapter as presented by the reader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chapter {
	pub slug: String,
	pub title: String,
}

impl From<&ChapterConfig> for Chapter {
	fn from(config: &ChapterConfig) -> Self {
		Self {
			slug: config.slug.clone(),
			title: config.title.clone(),
		}
	}
}

/// Ordered chapters plus the one currently open.
///
/// Navigation is bounded at both ends and never wraps.
#[derive(Debug, Clone)]
pub struct ChapterReader {
	chapters: Vec<Chapter>,
	index: usize,
}

impl ChapterReader {
	pub fn new(chapters: Vec<Chapter>) -> Result<Self, ReaderError> {
		if chapters.is_empty() {
			return Err(ReaderError::Empty);
		}
		Ok(Self { chapters, index: 0 })
	}

	pub fn from_config(config: &ReaderConfig) -> Result<Self, ReaderError> {
		Self::new(config.chapters.iter().map(Chapter::from).collect())
	}

	pub fn chapters(&self) -> &[Chapter] {
		&self.chapters
	}

	pub fn current(&self) -> &Chapter {
		&self.chapters[self.index]
	}

	pub fn has_next(&self) -> bool {
		self.index + 1 < self.chapters.len()
	}

	pub fn has_previous(&self) -> bool {
		self.index > 0
	}

	/// Opens the following chapter, if any.
	pub fn next(&mut self) -> Option<&Chapter> {
		if !self.has_next() {
			return None;
		}
		self.index += 1;
		Some(self.current())
	}

	/// Opens the preceding chapter, if any.
	pub fn previous(&mut self) -> Option<&Chapter> {
		if !self.has_previous() {
			return None;
		}
		self.index -= 1;
		Some(self.current())
	}

	pub fn go_to(&mut self, slug: &str) -> Result<&Chapter, ReaderError> {
		self.index = self
			.chapters
			.iter()
			.position(|c| c.slug == slug)
			.ok_or_else(|| ReaderError::UnknownChapter(slug.to_string()))?;
		tracing::debug!(chapter = slug, index = self.index + 1, "Opened chapter");
		Ok(self.current())
	}

	/// `(1-based index of the current chapter, total chapters)`.
	pub fn progress(&self) -> (usize, usize) {
		(self.index + 1, self.chapters.len())
	}
}
