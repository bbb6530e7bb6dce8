//! Organization root: a lazily built, time-bounded cache of scout groups.
//!
//! Each group id moves through `Absent -> Building -> Cached` and back to
//! `Building` once its entry expires. The build for a group runs in its own
//! tokio task and publishes into the cache itself, so every caller that
//! arrives while it is running awaits the same result, and a caller that
//! gives up does not cancel it.
//!
//! The waiting list and custom lists are fetched in the same build but are
//! not required for it: when either fails the group is still cached and the
//! failure is reported by the accessor for that list.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock, Weak};
use std::time::Duration;

use futures::future::{self, BoxFuture, FutureExt, Shared};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::branch::BranchTable;
use crate::error::{OrgError, OrgResult};
use crate::factory::{CustomListFactory, GroupFactory, WaitingListFactory};
use crate::group::{CustomListSource, ScoutGroup};
use crate::models::{CustomList, WaitingList};
use crate::provider::Provider;
use crate::store::{IndexBy, IndexSnapshot, MultiIndex};

type SharedBuild = Shared<BoxFuture<'static, OrgResult<Arc<CachedEntry>>>>;

/// Everything one build produces for a group
struct BuiltGroup {
    group: ScoutGroup,
    waiting_list: OrgResult<WaitingList>,
    custom_lists: OrgResult<MultiIndex<CustomList>>,
}

struct CachedEntry {
    group: Arc<ScoutGroup>,
    waiting_list: OrgResult<Arc<WaitingList>>,
    /// Outcome of the custom list fetch; the lists live in the registry
    custom_lists: OrgResult<()>,
    expires_at: Instant,
}

impl CachedEntry {
    fn is_fresh(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

enum Slot {
    Building { generation: u64, build: SharedBuild },
    Cached(Arc<CachedEntry>),
}

#[derive(Default)]
struct Slots {
    entries: HashMap<i64, Slot>,
    next_generation: u64,
}

/// Custom lists of every group, owned by the organization and handed to
/// groups as a `CustomListSource`.
#[derive(Default)]
struct CustomListRegistry {
    lists: RwLock<HashMap<i64, Arc<MultiIndex<CustomList>>>>,
}

impl CustomListRegistry {
    fn replace(&self, group_id: i64, lists: MultiIndex<CustomList>) {
        self.lists
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(group_id, Arc::new(lists));
    }

    fn remove(&self, group_id: i64) {
        self.lists
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&group_id);
    }
}

impl CustomListSource for CustomListRegistry {
    fn custom_lists(&self, group_id: i64, by: IndexBy) -> IndexSnapshot<CustomList> {
        let lists = self.lists.read().unwrap_or_else(|e| e.into_inner());
        match lists.get(&group_id) {
            Some(store) => store.all(by),
            None => MultiIndex::default().all(by),
        }
    }
}

struct OrgInner {
    providers: HashMap<i64, Arc<dyn Provider>>,
    group_factory: GroupFactory,
    waiting_list_factory: WaitingListFactory,
    custom_list_factory: CustomListFactory,
    custom_lists: Arc<CustomListRegistry>,
    slots: Mutex<Slots>,
}

/// The scout organization: the one place callers obtain groups from.
///
/// Cheap to clone; clones share the same cache.
#[derive(Clone)]
pub struct ScoutOrg {
    inner: Arc<OrgInner>,
}

impl ScoutOrg {
    pub fn new(providers: Vec<Arc<dyn Provider>>, branches: BranchTable) -> Self {
        let providers = providers
            .into_iter()
            .map(|provider| (provider.group_id(), provider))
            .collect();

        Self {
            inner: Arc::new(OrgInner {
                providers,
                group_factory: GroupFactory::new(Arc::new(branches)),
                waiting_list_factory: WaitingListFactory::new(),
                custom_list_factory: CustomListFactory::new(),
                custom_lists: Arc::new(CustomListRegistry::default()),
                slots: Mutex::new(Slots::default()),
            }),
        }
    }

    /// Ids of every group this organization can load
    pub fn group_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.inner.providers.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Get a group, building it if it is absent or expired.
    pub async fn group(&self, id: i64) -> OrgResult<Arc<ScoutGroup>> {
        let entry = self.entry(id).await?;
        Ok(Arc::clone(&entry.group))
    }

    /// Waiting list of a group, fetched in the same pass as the group.
    /// A failed waiting list fetch is reported here until the entry expires.
    pub async fn waiting_list(&self, id: i64) -> OrgResult<Arc<WaitingList>> {
        let entry = self.entry(id).await?;
        entry.waiting_list.clone()
    }

    /// Custom lists of a group, indexed by id or by title
    pub async fn custom_lists(&self, id: i64, by: IndexBy) -> OrgResult<IndexSnapshot<CustomList>> {
        let entry = self.entry(id).await?;
        entry.custom_lists.clone()?;
        Ok(self.inner.custom_lists.custom_lists(id, by))
    }

    /// Drop the cached entry for a group so the next request rebuilds it.
    /// An in-flight build still answers its waiters but is not cached.
    pub fn invalidate(&self, id: i64) -> bool {
        let removed = self.inner.lock_slots().entries.remove(&id).is_some();
        if removed {
            info!(group_id = id, "Invalidated cached group");
        }
        removed
    }

    /// Remaining time before the cached entry for a group expires
    pub fn time_to_expiry(&self, id: i64) -> Option<Duration> {
        match self.inner.lock_slots().entries.get(&id) {
            Some(Slot::Cached(entry)) if entry.is_fresh() => {
                Some(entry.expires_at.saturating_duration_since(Instant::now()))
            }
            _ => None,
        }
    }

    async fn entry(&self, id: i64) -> OrgResult<Arc<CachedEntry>> {
        let build = {
            let mut slots = self.inner.lock_slots();
            let in_flight = match slots.entries.get(&id) {
                Some(Slot::Cached(entry)) if entry.is_fresh() => return Ok(Arc::clone(entry)),
                Some(Slot::Building { build, .. }) => Some(build.clone()),
                _ => None,
            };
            match in_flight {
                Some(build) => {
                    debug!(group_id = id, "Joining in-flight group build");
                    build
                }
                None => OrgInner::start_build(&self.inner, &mut slots, id)?,
            }
        };
        build.await
    }
}

impl OrgInner {
    fn lock_slots(&self) -> MutexGuard<'_, Slots> {
        self.slots.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Spawn the build for `id` and record it as the slot's in-flight build.
    /// Must be called with the slot lock held so no second build can start.
    fn start_build(this: &Arc<Self>, slots: &mut Slots, id: i64) -> OrgResult<SharedBuild> {
        let provider = this
            .providers
            .get(&id)
            .cloned()
            .ok_or(OrgError::UnknownGroup(id))?;

        let generation = slots.next_generation;
        slots.next_generation += 1;
        info!(group_id = id, generation, "Building scout group");

        let inner = Arc::clone(this);
        let task = tokio::spawn(async move {
            match inner.build(id, provider.as_ref()).await {
                Ok(built) => Ok(inner.publish(id, generation, built, provider.cache_lifetime())),
                Err(e) => {
                    warn!(group_id = id, generation, error = %e, "Group build failed");
                    inner.discard(id, generation);
                    Err(e)
                }
            }
        });

        let weak: Weak<Self> = Arc::downgrade(this);
        let build = async move {
            match task.await {
                Ok(result) => result,
                Err(join_error) => {
                    error!(group_id = id, error = %join_error, "Group build task died");
                    if let Some(inner) = weak.upgrade() {
                        inner.discard(id, generation);
                    }
                    Err(OrgError::BuildAborted(join_error.to_string()))
                }
            }
        }
        .boxed()
        .shared();

        slots.entries.insert(
            id,
            Slot::Building {
                generation,
                build: build.clone(),
            },
        );
        Ok(build)
    }

    async fn build(&self, id: i64, provider: &dyn Provider) -> OrgResult<BuiltGroup> {
        let raw_members = provider.member_list().await?;
        let group = self
            .group_factory
            .build(id, &raw_members, self.custom_lists.clone())?;

        let (waiting_list, custom_lists) = tokio::join!(
            self.build_waiting_list(provider),
            self.build_custom_lists(provider)
        );
        if let Err(ref e) = waiting_list {
            warn!(group_id = id, error = %e, "Waiting list unavailable");
        }
        if let Err(ref e) = custom_lists {
            warn!(group_id = id, error = %e, "Custom lists unavailable");
        }

        Ok(BuiltGroup {
            group,
            waiting_list,
            custom_lists,
        })
    }

    async fn build_waiting_list(&self, provider: &dyn Provider) -> OrgResult<WaitingList> {
        let raw = provider.waiting_list().await?;
        self.waiting_list_factory.build(&raw)
    }

    async fn build_custom_lists(&self, provider: &dyn Provider) -> OrgResult<MultiIndex<CustomList>> {
        let catalogue = provider.custom_lists().await?;
        let list_ids = self.custom_list_factory.list_ids(&catalogue)?;
        let members = future::try_join_all(list_ids.into_iter().map(|list_id| async move {
            let raw = provider.custom_list_members(list_id).await?;
            Ok::<_, OrgError>((list_id, raw))
        }))
        .await?;
        let members: HashMap<i64, _> = members.into_iter().collect();
        self.custom_list_factory.build(&catalogue, &members)
    }

    fn is_current(slots: &Slots, id: i64, generation: u64) -> bool {
        matches!(
            slots.entries.get(&id),
            Some(Slot::Building { generation: current, .. }) if *current == generation
        )
    }

    fn publish(&self, id: i64, generation: u64, built: BuiltGroup, lifetime: Duration) -> Arc<CachedEntry> {
        let (custom_lists, lists) = match built.custom_lists {
            Ok(lists) => (Ok(()), Some(lists)),
            Err(e) => (Err(e), None),
        };
        let entry = Arc::new(CachedEntry {
            group: Arc::new(built.group),
            waiting_list: built.waiting_list.map(Arc::new),
            custom_lists,
            expires_at: Instant::now() + lifetime,
        });

        let mut slots = self.lock_slots();
        if Self::is_current(&slots, id, generation) {
            match lists {
                Some(lists) => self.custom_lists.replace(id, lists),
                None => self.custom_lists.remove(id),
            }
            slots.entries.insert(id, Slot::Cached(Arc::clone(&entry)));
            info!(
                group_id = id,
                generation,
                members = entry.group.member_count(),
                lifetime_secs = lifetime.as_secs(),
                "Cached scout group"
            );
        } else {
            debug!(group_id = id, generation, "Build superseded, result not cached");
        }
        entry
    }

    /// Revert a failed build's slot to absent
    fn discard(&self, id: i64, generation: u64) {
        let mut slots = self.lock_slots();
        if Self::is_current(&slots, id, generation) {
            slots.entries.remove(&id);
        }
    }
}
