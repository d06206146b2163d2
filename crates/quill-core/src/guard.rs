//! Authorization guard for post access.
//!
//! Decides whether a caller may perform an action on a post, based on the
//! soft-delete flag, the visibility state, and authorship. Authorship is the
//! sole authorization axis; there is no admin bypass.

use uuid::Uuid;

use crate::domain::{Post, PostState};
use crate::error::DomainError;

/// A resolved caller identity, as supplied by the authentication collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub id: Uuid,
    pub username: String,
}

/// Action a caller wants to perform on a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Public read of a single post.
    Read,
    /// Author reading their own post, drafts included.
    ReadAsOwner,
    Update,
    Delete,
}

/// Reason an action was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    /// The post is soft-deleted and no longer available to anyone.
    Gone,
    /// The post is invisible on this path (e.g. a draft read publicly).
    NotFound,
    /// The caller is not the author.
    Forbidden,
}

impl Denial {
    /// Map a denial to the domain error surfaced to callers. `NotFound`
    /// carries the requested id so the message matches a genuine miss.
    pub fn into_error(self, post_id: Uuid) -> DomainError {
        match self {
            Self::Gone => DomainError::Gone,
            Self::NotFound => DomainError::not_found("post", post_id),
            Self::Forbidden => DomainError::Forbidden,
        }
    }
}

/// Evaluate the access rules in order; the first matching rule wins.
///
/// 1. Soft-deleted posts answer `Gone` to every action and caller,
///    the author included.
/// 2. A public `Read` of anything but a published post is `NotFound`
///    (drafts must be indistinguishable from missing posts).
/// 3. `Update`, `Delete`, and `ReadAsOwner` require authorship, compared by
///    stable id rather than display name.
pub fn authorize(caller: Option<&Caller>, post: &Post, action: Action) -> Result<(), Denial> {
    if post.deleted {
        return Err(Denial::Gone);
    }

    match action {
        Action::Read => {
            if post.state != PostState::Published {
                return Err(Denial::NotFound);
            }
            Ok(())
        }
        Action::ReadAsOwner | Action::Update | Action::Delete => match caller {
            Some(caller) if caller.id == post.author_id => Ok(()),
            _ => Err(Denial::Forbidden),
        },
    }
}
