use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use super::{MemberRepository, RepositoryError, RepositoryFuture, RepositoryResult};
use crate::domain::Member;
use futures_util::FutureExt;
use tracing::{debug, span, Instrument, Level};

#[derive(Default)]
struct Store {
    members: HashMap<u64, Member>,
    sequence: u64,
}

/// Keeps members in a map guarded by a single lock.
///
/// Clones share the same store. Members go in and come out as copies, so
/// changing a returned member does not touch the stored one.
#[derive(Clone, Default)]
pub struct InMemoryMemberRepository {
    store: Arc<Mutex<Store>>,
}
static_assertions::assert_impl_all!(InMemoryMemberRepository: Send, Sync, Clone);

impl InMemoryMemberRepository {
    pub fn new() -> Box<dyn MemberRepository> {
        Box::new(InMemoryMemberRepository::new_unboxed()) as Box<dyn MemberRepository>
    }

    pub fn new_unboxed() -> InMemoryMemberRepository {
        InMemoryMemberRepository::default()
    }

    fn lock(&self) -> RepositoryResult<MutexGuard<'_, Store>> {
        self.store.lock().map_err(|_| RepositoryError::Poisoned)
    }

    /// Drops every stored member. The id sequence keeps counting from where
    /// it was, so ids are never handed out twice by the same repository.
    pub fn clear(&self) -> RepositoryResult<()> {
        let mut store = self.lock()?;
        debug!(removed = store.members.len(), sequence = store.sequence);
        store.members.clear();
        Ok(())
    }

    fn insert(&self, mut member: Member) -> RepositoryResult<Member> {
        if let Some(id) = member.id() {
            return Err(RepositoryError::IdAlreadyAssigned(id));
        }

        let mut store = self.lock()?;
        store.sequence += 1;
        let id = store.sequence;
        member.set_id(id);
        store.members.insert(id, member.clone());
        debug!(id = id, name = %member.name());
        Ok(member)
    }
}

impl MemberRepository for InMemoryMemberRepository {
    fn save<'a>(&'a self, member: Member) -> RepositoryFuture<'a, RepositoryResult<Member>> {
        let span = span!(Level::INFO, "InMemoryMemberRepository::save");
        async move { self.insert(member) }.instrument(span).boxed()
    }

    fn find_by_id<'a>(&'a self, id: u64) -> RepositoryFuture<'a, RepositoryResult<Option<Member>>> {
        let span = span!(Level::INFO, "InMemoryMemberRepository::find_by_id");
        async move {
            let store = self.lock()?;
            let r = store.members.get(&id).cloned();
            debug!(id = id, found = r.is_some());
            Ok::<_, RepositoryError>(r)
        }
        .instrument(span)
        .boxed()
    }

    fn find_by_name<'a>(
        &'a self,
        name: &'a str,
    ) -> RepositoryFuture<'a, RepositoryResult<Option<Member>>> {
        let span = span!(Level::INFO, "InMemoryMemberRepository::find_by_name");
        async move {
            let store = self.lock()?;
            let r = store.members.values().find(|m| m.name() == name).cloned();
            debug!(name = %name, result = ?r);
            Ok::<_, RepositoryError>(r)
        }
        .instrument(span)
        .boxed()
    }

    fn find_all<'a>(&'a self) -> RepositoryFuture<'a, RepositoryResult<Vec<Member>>> {
        let span = span!(Level::INFO, "InMemoryMemberRepository::find_all");
        async move {
            let store = self.lock()?;
            let r: Vec<Member> = store.members.values().cloned().collect();
            debug!(count = r.len());
            Ok::<_, RepositoryError>(r)
        }
        .instrument(span)
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn names(members: &[Member]) -> HashSet<String> {
        members.iter().map(|m| m.name().to_owned()).collect()
    }

    #[tokio::test]
    async fn save_and_find() -> anyhow::Result<()> {
        let repo = InMemoryMemberRepository::new();

        let saved = repo.save(Member::new("spring")).await?;
        assert_eq!(saved.id(), Some(1));

        let found = repo.find_by_id(1).await?.expect("member 1 is stored");
        assert_eq!(found.name(), "spring");
        assert_eq!(found, saved);
        Ok(())
    }

    #[tokio::test]
    async fn find_by_name() -> anyhow::Result<()> {
        let repo = InMemoryMemberRepository::new();
        repo.save(Member::new("spring")).await?;
        let spring2 = repo.save(Member::new("spring2")).await?;

        let found = repo.find_by_name("spring2").await?.expect("spring2 exists");
        assert_eq!(found.name(), "spring2");
        assert_eq!(found.id(), spring2.id());
        Ok(())
    }

    #[tokio::test]
    async fn find_by_name_with_duplicates() -> anyhow::Result<()> {
        let repo = InMemoryMemberRepository::new();
        let a = repo.save(Member::new("twin")).await?;
        let b = repo.save(Member::new("twin")).await?;
        repo.save(Member::new("other")).await?;

        let found = repo.find_by_name("twin").await?.expect("a twin exists");
        assert_eq!(found.name(), "twin");
        assert!(found == a || found == b);
        Ok(())
    }

    #[tokio::test]
    async fn find_by_name_is_exact() -> anyhow::Result<()> {
        let repo = InMemoryMemberRepository::new();
        repo.save(Member::new("Spring")).await?;

        assert!(repo.find_by_name("spring").await?.is_none());
        assert!(repo.find_by_name("Spring ").await?.is_none());
        assert!(repo.find_by_name("Spring").await?.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn find_all() -> anyhow::Result<()> {
        let repo = InMemoryMemberRepository::new();
        repo.save(Member::new("spring1")).await?;
        repo.save(Member::new("spring2")).await?;

        let all = repo.find_all().await?;
        assert_eq!(all.len(), 2);
        let expected: HashSet<String> = vec!["spring1".to_owned(), "spring2".to_owned()]
            .into_iter()
            .collect();
        assert_eq!(names(&all), expected);
        Ok(())
    }

    #[tokio::test]
    async fn miss_on_empty_store() -> anyhow::Result<()> {
        let repo = InMemoryMemberRepository::new();
        assert!(repo.find_by_id(42).await?.is_none());
        assert!(repo.find_by_name("x").await?.is_none());
        assert!(repo.find_all().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn ids_are_increasing_from_one() -> anyhow::Result<()> {
        let repo = InMemoryMemberRepository::new();
        let mut ids = vec![];
        for i in 0..10 {
            let m = repo.save(Member::new(format!("m{}", i))).await?;
            ids.push(m.id().expect("saved member has id"));
        }
        assert_eq!(ids, (1..=10).collect::<Vec<u64>>());
        Ok(())
    }

    #[tokio::test]
    async fn clear_empties_store() -> anyhow::Result<()> {
        let repo = InMemoryMemberRepository::new_unboxed();
        repo.save(Member::new("spring")).await?;

        repo.clear()?;
        assert!(repo.find_all().await?.is_empty());
        assert!(repo.find_by_id(1).await?.is_none());

        let m = repo.save(Member::new("again")).await?;
        assert!(m.id().is_some());
        assert_eq!(repo.find_all().await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn clear_keeps_sequence() -> anyhow::Result<()> {
        let repo = InMemoryMemberRepository::new_unboxed();
        let first = repo.save(Member::new("first")).await?;
        assert_eq!(first.id(), Some(1));

        repo.clear()?;

        let second = repo.save(Member::new("second")).await?;
        assert_eq!(second.id(), Some(2));
        Ok(())
    }

    #[tokio::test]
    async fn rejects_assigned_id() -> anyhow::Result<()> {
        let repo = InMemoryMemberRepository::new();
        let mut m = Member::new("spring");
        m.set_id(5);

        match repo.save(m).await {
            Err(RepositoryError::IdAlreadyAssigned(5)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(repo.find_all().await?.is_empty());

        let fresh = repo.save(Member::new("fresh")).await?;
        assert_eq!(fresh.id(), Some(1));
        Ok(())
    }

    #[tokio::test]
    async fn returned_members_are_copies() -> anyhow::Result<()> {
        let repo = InMemoryMemberRepository::new();
        let mut saved = repo.save(Member::new("spring")).await?;
        saved.set_name("changed");

        let mut all = repo.find_all().await?;
        all[0].set_name("changed too");
        all.clear();

        let stored = repo.find_by_id(1).await?.expect("member 1 is stored");
        assert_eq!(stored.name(), "spring");
        assert_eq!(repo.find_all().await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn separate_instances_do_not_share() -> anyhow::Result<()> {
        let a = InMemoryMemberRepository::new();
        let b = InMemoryMemberRepository::new();
        a.save(Member::new("only in a")).await?;

        assert!(b.find_all().await?.is_empty());
        assert_eq!(b.save(Member::new("b")).await?.id(), Some(1));
        Ok(())
    }

    #[tokio::test]
    async fn clones_share_store() -> anyhow::Result<()> {
        let a = InMemoryMemberRepository::new_unboxed();
        let b = a.clone();
        a.save(Member::new("shared")).await?;

        assert!(b.find_by_name("shared").await?.is_some());
        assert_eq!(b.save(Member::new("next")).await?.id(), Some(2));
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_saves_get_distinct_ids() -> anyhow::Result<()> {
        let repo = InMemoryMemberRepository::new_unboxed();
        let mut handles = vec![];
        for i in 0..64 {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                repo.save(Member::new(format!("member{}", i))).await
            }));
        }

        let mut ids = HashSet::new();
        for h in handles {
            let m = h.await??;
            assert!(ids.insert(m.id().expect("saved member has id")));
        }

        assert_eq!(ids.len(), 64);
        assert_eq!(repo.find_all().await?.len(), 64);
        assert_eq!(ids.iter().max(), Some(&64));
        Ok(())
    }

    #[tokio::test]
    async fn poisoned_lock_is_reported() {
        let repo = InMemoryMemberRepository::new_unboxed();
        let store = repo.store.clone();
        let poisoner = std::thread::spawn(move || {
            let _guard = store.lock().unwrap();
            panic!("holding the store lock");
        });
        assert!(poisoner.join().is_err());

        assert!(matches!(
            repo.save(Member::new("spring")).await,
            Err(RepositoryError::Poisoned)
        ));
        assert!(matches!(
            repo.find_by_id(1).await,
            Err(RepositoryError::Poisoned)
        ));
        assert!(matches!(
            repo.find_by_name("spring").await,
            Err(RepositoryError::Poisoned)
        ));
        assert!(matches!(
            repo.find_all().await,
            Err(RepositoryError::Poisoned)
        ));
        assert!(matches!(repo.clear(), Err(RepositoryError::Poisoned)));
    }
}
