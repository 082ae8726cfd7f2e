pub mod mem;

use crate::domain::Member;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("member already has id {0}")]
    IdAlreadyAssigned(u64),
    #[error("repository lock poisoned")]
    Poisoned,
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

pub type RepositoryFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Storage for members.
///
/// `save` assigns a fresh id to a member that has none and stores it.
/// Lookups never fail on a miss, they return `None`. `find_all` returns a
/// snapshot in no particular order.
pub trait MemberRepository: Send + Sync {
    fn save<'a>(&'a self, member: Member) -> RepositoryFuture<'a, RepositoryResult<Member>>;

    fn find_by_id<'a>(&'a self, id: u64) -> RepositoryFuture<'a, RepositoryResult<Option<Member>>>;

    /// Any one member with exactly this name.
    fn find_by_name<'a>(
        &'a self,
        name: &'a str,
    ) -> RepositoryFuture<'a, RepositoryResult<Option<Member>>>;

    fn find_all<'a>(&'a self) -> RepositoryFuture<'a, RepositoryResult<Vec<Member>>>;
}
