// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Principal attribute sources.
//!
//! A policy may name a [`PrincipalAttributesRepository`] to fetch attributes
//! from instead of the principal handed to the pipeline. After definitions are
//! resolved, the pipeline reports the resolved set through
//! [`PrincipalAttributesRepository::update`].
//!
//! [`PrincipalAttributesRepository::attributes`] must always return
//! pre-resolution attributes: the pipeline resolves whatever it is given, so
//! serving a resolved set back would apply definitions twice.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use loom_attributes_core::{AttributeContainer, Principal, RegisteredService};
use tokio::sync::RwLock;
use tracing::{instrument, trace};

use crate::error::Result;

/// Source of principal attributes for a registered service.
#[async_trait]
pub trait PrincipalAttributesRepository: Send + Sync {
	/// Raw attributes for `principal`, before definition resolution.
	async fn attributes(
		&self,
		principal: &Principal,
		registered_service: &RegisteredService,
	) -> Result<AttributeContainer>;

	/// Receives the attributes resolved from the last [`Self::attributes`] call.
	async fn update(
		&self,
		_principal_id: &str,
		_attributes: &AttributeContainer,
		_registered_service: &RegisteredService,
	) -> Result<()> {
		Ok(())
	}
}

type CacheKey = (String, i64);

#[derive(Debug, Clone)]
struct CachedAttributes {
	raw: AttributeContainer,
	resolved: Option<AttributeContainer>,
	cached_at: DateTime<Utc>,
}

/// Caches raw attributes per principal and registered service for a fixed
/// time-to-live.
///
/// On a miss the principal's own attributes are returned and cached. Expired
/// entries are purged whenever the cache is written.
#[derive(Debug)]
pub struct CachingPrincipalAttributesRepository {
	ttl: Duration,
	cache: RwLock<HashMap<CacheKey, CachedAttributes>>,
}

impl CachingPrincipalAttributesRepository {
	pub fn new(ttl: Duration) -> Self {
		Self {
			ttl,
			cache: RwLock::new(HashMap::new()),
		}
	}

	pub async fn len(&self) -> usize {
		self.cache.read().await.len()
	}

	pub async fn is_empty(&self) -> bool {
		self.cache.read().await.is_empty()
	}

	/// Drops every cached entry for `principal_id`, across services.
	pub async fn invalidate(&self, principal_id: &str) {
		self.cache
			.write()
			.await
			.retain(|(cached_principal, _), _| cached_principal != principal_id);
	}

	/// The set last resolved for this principal and service, while fresh.
	pub async fn resolved(
		&self,
		principal_id: &str,
		registered_service: &RegisteredService,
	) -> Option<AttributeContainer> {
		let key = (principal_id.to_string(), registered_service.id);
		let cache = self.cache.read().await;
		cache
			.get(&key)
			.filter(|entry| self.is_fresh(entry, Utc::now()))
			.and_then(|entry| entry.resolved.clone())
	}

	fn is_fresh(&self, entry: &CachedAttributes, now: DateTime<Utc>) -> bool {
		now - entry.cached_at < self.ttl
	}

	fn purge_expired(&self, cache: &mut HashMap<CacheKey, CachedAttributes>, now: DateTime<Utc>) {
		let before = cache.len();
		cache.retain(|_, entry| self.is_fresh(entry, now));
		let purged = before - cache.len();
		if purged > 0 {
			trace!(purged, "expired principal attribute entries purged");
		}
	}
}

#[async_trait]
impl PrincipalAttributesRepository for CachingPrincipalAttributesRepository {
	#[instrument(level = "trace", skip_all, fields(principal_id = %principal.id, registered_service = registered_service.id))]
	async fn attributes(
		&self,
		principal: &Principal,
		registered_service: &RegisteredService,
	) -> Result<AttributeContainer> {
		let key = (principal.id.clone(), registered_service.id);
		let now = Utc::now();
		if let Some(entry) = self.cache.read().await.get(&key) {
			if self.is_fresh(entry, now) {
				trace!("principal attributes served from cache");
				return Ok(entry.raw.clone());
			}
		}

		let raw = principal.attributes.clone();
		let mut cache = self.cache.write().await;
		self.purge_expired(&mut cache, now);
		cache.insert(
			key,
			CachedAttributes {
				raw: raw.clone(),
				resolved: None,
				cached_at: now,
			},
		);
		Ok(raw)
	}

	async fn update(
		&self,
		principal_id: &str,
		attributes: &AttributeContainer,
		registered_service: &RegisteredService,
	) -> Result<()> {
		let key = (principal_id.to_string(), registered_service.id);
		let now = Utc::now();
		let mut cache = self.cache.write().await;
		self.purge_expired(&mut cache, now);
		match cache.get_mut(&key) {
			Some(entry) => entry.resolved = Some(attributes.clone()),
			None => trace!(principal_id, "no cached entry to update"),
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	fn registered(id: i64) -> RegisteredService {
		RegisteredService::new(id, "app", "https://app.example.com/.*")
	}

	fn jdoe() -> Principal {
		Principal::new("jdoe").with_attribute("uid", vec![json!("jdoe")])
	}

	#[tokio::test]
	async fn miss_returns_principal_attributes() {
		let repository = CachingPrincipalAttributesRepository::new(Duration::minutes(5));

		let attributes = repository.attributes(&jdoe(), &registered(1)).await.unwrap();

		assert_eq!(attributes.get("uid"), Some(&[json!("jdoe")][..]));
		assert_eq!(repository.len().await, 1);
	}

	#[tokio::test]
	async fn cached_raw_attributes_outlive_principal_changes() {
		let repository = CachingPrincipalAttributesRepository::new(Duration::minutes(5));
		repository.attributes(&jdoe(), &registered(1)).await.unwrap();

		let renamed = Principal::new("jdoe").with_attribute("uid", vec![json!("jdoe2")]);
		let attributes = repository.attributes(&renamed, &registered(1)).await.unwrap();

		assert_eq!(attributes.get("uid"), Some(&[json!("jdoe")][..]));
	}

	#[tokio::test]
	async fn updates_never_replace_raw_attributes() {
		let repository = CachingPrincipalAttributesRepository::new(Duration::minutes(5));
		let raw = repository.attributes(&jdoe(), &registered(1)).await.unwrap();

		let mut resolved = AttributeContainer::new();
		resolved.insert_value("uid", "urn:jdoe");
		repository
			.update("jdoe", &resolved, &registered(1))
			.await
			.unwrap();

		assert_eq!(repository.attributes(&jdoe(), &registered(1)).await.unwrap(), raw);
		assert_eq!(repository.resolved("jdoe", &registered(1)).await, Some(resolved));
	}

	#[tokio::test]
	async fn entries_are_kept_per_registered_service() {
		let repository = CachingPrincipalAttributesRepository::new(Duration::minutes(5));
		repository.attributes(&jdoe(), &registered(1)).await.unwrap();

		let mut resolved = AttributeContainer::new();
		resolved.insert_value("eppn", "jdoe@example.com");
		repository
			.update("jdoe", &resolved, &registered(1))
			.await
			.unwrap();

		let other = repository.attributes(&jdoe(), &registered(2)).await.unwrap();
		assert!(!other.contains("eppn"));
		assert_eq!(repository.resolved("jdoe", &registered(2)).await, None);
		assert_eq!(repository.len().await, 2);
	}

	#[tokio::test]
	async fn expired_entries_fall_back_to_principal() {
		let repository = CachingPrincipalAttributesRepository::new(Duration::zero());
		repository.attributes(&jdoe(), &registered(1)).await.unwrap();

		let renamed = Principal::new("jdoe").with_attribute("uid", vec![json!("jdoe2")]);
		let attributes = repository.attributes(&renamed, &registered(1)).await.unwrap();
		assert_eq!(attributes.get("uid"), Some(&[json!("jdoe2")][..]));
	}

	#[tokio::test]
	async fn expired_entries_are_purged_on_write() {
		let repository = CachingPrincipalAttributesRepository::new(Duration::zero());
		for id in 1..=3 {
			repository.attributes(&jdoe(), &registered(id)).await.unwrap();
		}
		assert_eq!(repository.len().await, 1);

		repository
			.update("jdoe", &AttributeContainer::new(), &registered(3))
			.await
			.unwrap();
		assert!(repository.is_empty().await);
	}

	#[tokio::test]
	async fn invalidate_drops_every_service_entry() {
		let repository = CachingPrincipalAttributesRepository::new(Duration::minutes(5));
		repository.attributes(&jdoe(), &registered(1)).await.unwrap();
		repository.attributes(&jdoe(), &registered(2)).await.unwrap();
		repository
			.attributes(&Principal::new("asmith"), &registered(1))
			.await
			.unwrap();

		repository.invalidate("jdoe").await;
		assert_eq!(repository.len().await, 1);
	}
}
