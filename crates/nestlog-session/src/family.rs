//! Family-scoped selection state
//!
//! Persists which child is selected and which children are marked asleep
//! under keys namespaced by tenant id, so multiple tenant sessions cached
//! in one browser profile never bleed into each other. `select_baby` is
//! the single choke point: a selection referencing another tenant's child
//! is rejected, logged, and never persisted.

use nestlog_auth::store::{keys, ClientStore, StoreResult};
use nestlog_core::{AuthApi, Baby, Family, Route};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Per-tenant selection state backed by the client store
pub struct FamilyScopeStore {
    store: ClientStore,
    active: Option<Family>,
    selected_baby: Option<Baby>,
    sleeping: HashSet<String>,
}

impl FamilyScopeStore {
    pub fn new(store: ClientStore) -> Self {
        Self {
            store,
            active: None,
            selected_baby: None,
            sleeping: HashSet::new(),
        }
    }

    pub fn active_family(&self) -> Option<&Family> {
        self.active.as_ref()
    }

    pub fn selected_baby(&self) -> Option<&Baby> {
        self.selected_baby.as_ref()
    }

    pub fn is_sleeping(&self, baby_id: &str) -> bool {
        self.sleeping.contains(baby_id)
    }

    /// Re-resolve the active tenant from the current URL. Called on mount
    /// and on every navigation. An unknown slug or a route with no tenant
    /// clears the selection; a lookup that cannot be reached keeps the
    /// current tenant rather than flickering the UI empty.
    pub async fn navigate(&mut self, route: &Route, api: &dyn AuthApi) -> StoreResult<()> {
        let Some(slug) = route.tenant_slug.as_deref() else {
            return self.set_active_family(None).await;
        };
        match api.family_by_slug(slug).await {
            Ok(Some(config)) => self.set_active_family(Some(config.family())).await,
            Ok(None) => {
                warn!("Unknown tenant slug {}", slug);
                self.set_active_family(None).await
            }
            Err(e) => {
                warn!("Tenant lookup failed, keeping current tenant: {}", e);
                Ok(())
            }
        }
    }

    /// Switch the active tenant. Loads that tenant's cached selection and
    /// evicts any stale entry whose owning family no longer matches;
    /// clearing the tenant (None) drops the in-memory selection without
    /// touching other tenants' cached keys.
    pub async fn set_active_family(&mut self, family: Option<Family>) -> StoreResult<()> {
        if self.active == family {
            return Ok(());
        }

        self.active = family;
        self.selected_baby = None;
        self.sleeping.clear();

        let Some(active) = self.active.clone() else {
            debug!("No tenant resolvable, selection cleared");
            return Ok(());
        };

        self.store.set_json(keys::SELECTED_FAMILY, &active).await?;

        let baby_key = keys::selected_baby(&active.id);
        if let Some(baby) = self.store.get_json::<Baby>(&baby_key).await {
            if baby.family_id == active.id {
                self.selected_baby = Some(baby);
            } else {
                warn!(
                    "Discarding stale selection: baby {} belongs to family {}, not {}",
                    baby.id, baby.family_id, active.id
                );
                self.store.remove(&baby_key).await?;
            }
        }

        if let Some(ids) = self
            .store
            .get_json::<Vec<String>>(&keys::sleeping_babies(&active.id))
            .await
        {
            self.sleeping = ids.into_iter().collect();
        }

        Ok(())
    }

    /// Select a child within the active tenant. A child belonging to a
    /// different tenant is rejected: nothing is written and the cached
    /// selection stays as it was. Unreachable through normal navigation,
    /// so the rejection is logged but never surfaced to the user.
    pub async fn select_baby(&mut self, baby: &Baby) -> StoreResult<bool> {
        let Some(active) = &self.active else {
            warn!("Selection attempted with no active tenant");
            return Ok(false);
        };
        if baby.family_id != active.id {
            warn!(
                "Cross-tenant selection rejected: baby {} belongs to family {}, active is {}",
                baby.id, baby.family_id, active.id
            );
            return Ok(false);
        }

        self.selected_baby = Some(baby.clone());
        self.store
            .set_json(&keys::selected_baby(&active.id), baby)
            .await?;
        Ok(true)
    }

    /// Mark a child asleep or awake. Guarded the same way as selection;
    /// the persisted value is always the full set for the tenant.
    pub async fn set_sleeping(&mut self, baby: &Baby, sleeping: bool) -> StoreResult<bool> {
        let Some(active) = &self.active else {
            warn!("Sleep update attempted with no active tenant");
            return Ok(false);
        };
        if baby.family_id != active.id {
            warn!(
                "Cross-tenant sleep update rejected: baby {} belongs to family {}, active is {}",
                baby.id, baby.family_id, active.id
            );
            return Ok(false);
        }

        if sleeping {
            self.sleeping.insert(baby.id.clone());
        } else {
            self.sleeping.remove(&baby.id);
        }

        let mut ids: Vec<&String> = self.sleeping.iter().collect();
        ids.sort();
        self.store
            .set_json(&keys::sleeping_babies(&active.id), &ids)
            .await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn family(id: &str) -> Family {
        Family {
            id: id.to_string(),
            slug: format!("{id}-slug"),
        }
    }

    fn baby(id: &str, family_id: &str) -> Baby {
        Baby {
            id: id.to_string(),
            family_id: family_id.to_string(),
            name: format!("Baby {id}"),
        }
    }

    #[tokio::test]
    async fn test_select_within_tenant_persists() {
        let store = ClientStore::in_memory();
        let mut scope = FamilyScopeStore::new(store.clone());
        scope.set_active_family(Some(family("fam_1"))).await.unwrap();

        assert!(scope.select_baby(&baby("b1", "fam_1")).await.unwrap());
        assert_eq!(scope.selected_baby().unwrap().id, "b1");

        let persisted: Baby = store
            .get_json(&keys::selected_baby("fam_1"))
            .await
            .unwrap();
        assert_eq!(persisted.id, "b1");
    }

    #[tokio::test]
    async fn test_cross_tenant_select_is_a_noop() {
        let store = ClientStore::in_memory();
        let mut scope = FamilyScopeStore::new(store.clone());
        scope.set_active_family(Some(family("fam_1"))).await.unwrap();
        scope.select_baby(&baby("b1", "fam_1")).await.unwrap();

        // Baby from another tenant: rejected, persisted selection unchanged
        assert!(!scope.select_baby(&baby("intruder", "fam_2")).await.unwrap());
        assert_eq!(scope.selected_baby().unwrap().id, "b1");

        let persisted: Baby = store
            .get_json(&keys::selected_baby("fam_1"))
            .await
            .unwrap();
        assert_eq!(persisted.id, "b1");
    }

    #[tokio::test]
    async fn test_stale_entry_evicted_on_tenant_switch() {
        let store = ClientStore::in_memory();
        // A corrupted cache: fam_2's key holds fam_1's baby
        store
            .set_json(&keys::selected_baby("fam_2"), &baby("b1", "fam_1"))
            .await
            .unwrap();

        let mut scope = FamilyScopeStore::new(store.clone());
        scope.set_active_family(Some(family("fam_2"))).await.unwrap();

        assert!(scope.selected_baby().is_none());
        assert_eq!(store.get(&keys::selected_baby("fam_2")).await, None);
    }

    #[tokio::test]
    async fn test_tenant_switch_loads_that_tenants_selection() {
        let store = ClientStore::in_memory();
        let mut scope = FamilyScopeStore::new(store.clone());

        scope.set_active_family(Some(family("fam_1"))).await.unwrap();
        scope.select_baby(&baby("b1", "fam_1")).await.unwrap();
        scope.set_sleeping(&baby("b1", "fam_1"), true).await.unwrap();

        scope.set_active_family(Some(family("fam_2"))).await.unwrap();
        assert!(scope.selected_baby().is_none());
        assert!(!scope.is_sleeping("b1"));

        // Coming back restores the cached selection
        scope.set_active_family(Some(family("fam_1"))).await.unwrap();
        assert_eq!(scope.selected_baby().unwrap().id, "b1");
        assert!(scope.is_sleeping("b1"));
    }

    #[tokio::test]
    async fn test_clearing_tenant_keeps_other_caches() {
        let store = ClientStore::in_memory();
        let mut scope = FamilyScopeStore::new(store.clone());
        scope.set_active_family(Some(family("fam_1"))).await.unwrap();
        scope.select_baby(&baby("b1", "fam_1")).await.unwrap();

        scope.set_active_family(None).await.unwrap();
        assert!(scope.selected_baby().is_none());
        // fam_1's cache is intact for its next session
        assert!(store.get(&keys::selected_baby("fam_1")).await.is_some());
    }

    #[tokio::test]
    async fn test_navigate_resolves_and_clears() {
        let api = crate::testutil::MockApi::with_family("acme", "fam_1");
        let mut scope = FamilyScopeStore::new(ClientStore::in_memory());

        scope
            .navigate(&Route::parse("/acme/log-entry"), &api)
            .await
            .unwrap();
        assert_eq!(scope.active_family().unwrap().id, "fam_1");

        // Unknown slug and tenant-less routes clear the selection
        scope
            .navigate(&Route::parse("/nobody/log-entry"), &api)
            .await
            .unwrap();
        assert!(scope.active_family().is_none());

        scope
            .navigate(&Route::parse("/acme"), &api)
            .await
            .unwrap();
        scope.navigate(&Route::parse("/login"), &api).await.unwrap();
        assert!(scope.active_family().is_none());
    }

    #[tokio::test]
    async fn test_navigate_keeps_tenant_when_lookup_unreachable() {
        let api = crate::testutil::MockApi::with_family("acme", "fam_1");
        let mut scope = FamilyScopeStore::new(ClientStore::in_memory());
        scope
            .navigate(&Route::parse("/acme"), &api)
            .await
            .unwrap();

        let down = crate::testutil::MockApi {
            network_down: true,
            ..Default::default()
        };
        scope.navigate(&Route::parse("/acme"), &down).await.unwrap();
        assert_eq!(scope.active_family().unwrap().id, "fam_1");
    }

    #[tokio::test]
    async fn test_sleeping_set_full_overwrite() {
        let store = ClientStore::in_memory();
        let mut scope = FamilyScopeStore::new(store.clone());
        scope.set_active_family(Some(family("fam_1"))).await.unwrap();

        scope.set_sleeping(&baby("b1", "fam_1"), true).await.unwrap();
        scope.set_sleeping(&baby("b2", "fam_1"), true).await.unwrap();
        scope.set_sleeping(&baby("b1", "fam_1"), false).await.unwrap();

        let ids: Vec<String> = store
            .get_json(&keys::sleeping_babies("fam_1"))
            .await
            .unwrap();
        assert_eq!(ids, vec!["b2".to_string()]);

        // Cross-tenant sleep updates are rejected too
        assert!(!scope.set_sleeping(&baby("x", "fam_2"), true).await.unwrap());
    }
}
