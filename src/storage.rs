// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Image storage for recipe photos.
//!
//! Stores return a stable public URL for each object; the URL is what gets
//! persisted on the recipe.

use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Persist `body` under `key` and return its public URL.
    async fn put_image(&self, key: &str, body: Bytes, content_type: &str)
        -> anyhow::Result<String>;
}

/// Images written to a local directory and served by this API at `/uploads`.
#[derive(Clone)]
pub struct LocalImageStore {
    root: PathBuf,
    public_base: String,
}

impl LocalImageStore {
    /// `public_base` is the URL prefix the directory is served under,
    /// e.g. `https://api.example.com/uploads`.
    pub fn new(root: impl Into<PathBuf>, public_base: &str) -> Self {
        Self {
            root: root.into(),
            public_base: public_base.trim_end_matches('/').to_string(),
        }
    }

    fn path_for(&self, key: &str) -> anyhow::Result<PathBuf> {
        let relative = Path::new(key);
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        anyhow::ensure!(safe && !key.is_empty(), "invalid object key {key:?}");
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn put_image(
        &self,
        key: &str,
        body: Bytes,
        _content_type: &str,
    ) -> anyhow::Result<String> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("create_dir_all {}", parent.display()))?;
        }
        tokio::fs::write(&path, &body)
            .await
            .with_context(|| format!("write {}", path.display()))?;

        tracing::debug!(key, bytes = body.len(), "Stored image");
        Ok(format!("{}/{}", self.public_base, key))
    }
}

/// Images kept in memory. Can be told to fail, to exercise error paths.
#[derive(Default)]
pub struct MemoryImageStore {
    objects: DashMap<String, (Bytes, String)>,
    fail: AtomicBool,
}

impl MemoryImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `put_image` fail (or succeed again).
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Content type recorded for `key`.
    pub fn content_type(&self, key: &str) -> Option<String> {
        self.objects.get(key).map(|o| o.1.clone())
    }
}

#[async_trait]
impl ImageStore for MemoryImageStore {
    async fn put_image(
        &self,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> anyhow::Result<String> {
        anyhow::ensure!(!self.fail.load(Ordering::SeqCst), "image store unavailable");
        self.objects
            .insert(key.to_string(), (body, content_type.to_string()));
        Ok(format!("https://images.invalid/{}", key))
    }
}

/// File extension for an accepted image content type.
pub fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}
