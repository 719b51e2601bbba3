use crate::{
    db::{buckets, Store, StoreError},
    error::{Error, Result},
    models::{
        invite::{Invite, InviteStatus},
        password_reset::PassReset,
        user::{Role, User},
        PageWindow,
    },
    utils::token::user_id_for_email,
};

use super::common::{get_record, get_record_in, list_records, put_record, put_record_in, update_record};

pub async fn get_user(store: &Store, user_id: &str) -> Result<Option<User>, StoreError> {
    get_record(store, buckets::USER, user_id).await
}

pub async fn find_user_by_email(store: &Store, email: &str) -> Result<Option<User>, StoreError> {
    get_user(store, &user_id_for_email(email)).await
}

pub async fn put_user(store: &Store, user: &User) -> Result<(), StoreError> {
    put_record(store, buckets::USER, &user.uuid, user).await
}

/// Applies `apply` to the stored user in one write transaction. `None` when
/// the user does not exist.
pub async fn update_user<E, F>(store: &Store, user_id: &str, apply: F) -> Result<Option<User>, E>
where
    E: From<StoreError>,
    F: FnOnce(&mut User) -> Result<(), E>,
{
    update_record(store, buckets::USER, user_id, apply).await
}

pub async fn update_last_login(
    store: &Store,
    user_id: &str,
    at: i64,
) -> Result<Option<User>, StoreError> {
    update_user(store, user_id, |user| {
        user.last_login = at;
        user.last_modified = at;
        Ok(())
    })
    .await
}

/// Stores `user` as the account registered from `invite_id` and marks the
/// invitation accepted. The account takes the invitation's role. Both
/// records change in one write transaction.
pub async fn register_user(store: &Store, invite_id: &str, mut user: User, at: i64) -> Result<User> {
    let mut txn = store.begin_write().await?;

    let mut invite: Invite = get_record_in(&mut txn, buckets::INVITE, invite_id)
        .await?
        .filter(|invite: &Invite| !invite.deleted)
        .ok_or_else(|| Error::KeyNotFound(invite_id.to_string()))?;
    if invite.status != InviteStatus::Pending {
        return Err(Error::InviteClosed);
    }
    if !invite.email.eq_ignore_ascii_case(user.email.trim()) {
        return Err(Error::InviteMismatch);
    }
    if invite.expiry < at {
        return Err(Error::InviteExpired);
    }
    if get_record_in::<User>(&mut txn, buckets::USER, &user.uuid)
        .await?
        .is_some()
    {
        return Err(Error::AlreadyExists(user.email));
    }

    user.role = invite.role;
    user.invite = invite.uuid.clone();
    invite.status = InviteStatus::Accepted;
    invite.last_modified = at;

    put_record_in(&mut txn, buckets::USER, &user.uuid, &user).await?;
    put_record_in(&mut txn, buckets::INVITE, &invite.uuid, &invite).await?;
    txn.commit().await?;
    Ok(user)
}

/// Replaces the user's password hash and consumes the reset in one write
/// transaction. The reset must belong to the user, be unused and be
/// unexpired at `at`.
pub async fn reset_password(
    store: &Store,
    user_id: &str,
    reset_id: &str,
    password_hash: String,
    at: i64,
) -> Result<User> {
    let mut txn = store.begin_write().await?;

    let mut reset: PassReset = get_record_in(&mut txn, buckets::PASS_RESET, reset_id)
        .await?
        .ok_or_else(|| Error::KeyNotFound(reset_id.to_string()))?;
    if reset.user != user_id {
        return Err(Error::InvalidParameter("resetId".to_string()));
    }
    if reset.used {
        return Err(Error::ResetUsed);
    }
    if reset.expiry < at {
        return Err(Error::ResetExpired);
    }

    let mut user: User = get_record_in(&mut txn, buckets::USER, user_id)
        .await?
        .ok_or_else(|| Error::KeyNotFound(user_id.to_string()))?;
    user.password = password_hash;
    user.last_modified = at;
    reset.used = true;
    reset.last_modified = at;

    put_record_in(&mut txn, buckets::USER, &user.uuid, &user).await?;
    put_record_in(&mut txn, buckets::PASS_RESET, &reset.uuid, &reset).await?;
    txn.commit().await?;
    Ok(user)
}

/// One page of non-deleted users. Without a term administrators are left
/// out; with one, users match on email or role.
pub async fn list_users(
    store: &Store,
    term: Option<&str>,
    window: PageWindow,
) -> Result<Vec<User>, StoreError> {
    let users: Vec<User> = list_records(store, buckets::USER).await?;
    let matching = users
        .into_iter()
        .filter(|user| !user.deleted)
        .filter(|user| match term {
            Some(term) => user.matches_term(term),
            None => user.role != Role::Admin,
        })
        .take(window.target())
        .map(|mut user| {
            user.sanitize();
            user
        })
        .collect();
    Ok(window.slice(matching))
}
