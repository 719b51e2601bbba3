use crate::{
    db::{buckets, Store, StoreError},
    error::{Error, Result},
    models::{
        invite::{Invite, InviteStatus, UpdateInvitePayload},
        PageWindow,
    },
};

use super::common::{get_record, get_record_in, list_records, put_record, put_record_in, update_record};

pub async fn get_invite(store: &Store, invite_id: &str) -> Result<Option<Invite>, StoreError> {
    get_record(store, buckets::INVITE, invite_id).await
}

pub async fn put_invite(store: &Store, invite: &Invite) -> Result<(), StoreError> {
    put_record(store, buckets::INVITE, &invite.uuid, invite).await
}

/// Non-deleted invitation addressed to `email`, compared case-insensitively.
pub async fn find_invite_by_email(store: &Store, email: &str) -> Result<Option<Invite>, StoreError> {
    let email = email.trim().to_lowercase();
    let invites: Vec<Invite> = list_records(store, buckets::INVITE).await?;
    Ok(invites
        .into_iter()
        .find(|invite| !invite.deleted && invite.email.to_lowercase() == email))
}

/// Stores a new invitation unless one already exists for its email.
/// Returns `false` on a duplicate. The duplicate check runs while the write
/// lock is held, so two concurrent invitations for one address cannot both
/// be stored.
pub async fn create_invite(store: &Store, invite: &Invite) -> Result<bool, StoreError> {
    let bytes = serde_json::to_vec(invite)?;
    let mut txn = store.begin_write().await?;
    if find_invite_by_email(store, &invite.email).await?.is_some() {
        return Ok(false);
    }
    txn.put(buckets::INVITE, invite.uuid.as_bytes(), &bytes)
        .await?;
    txn.commit().await?;
    Ok(true)
}

/// Marks an invitation cancelled; the next invite sweep removes it.
pub async fn cancel_invite(store: &Store, invite_id: &str, at: i64) -> Result<Option<Invite>, StoreError> {
    update_record(store, buckets::INVITE, invite_id, |invite: &mut Invite| {
        invite.status = InviteStatus::Cancelled;
        invite.last_modified = at;
        Ok::<_, StoreError>(())
    })
    .await
}

pub async fn set_deleted(
    store: &Store,
    invite_id: &str,
    deleted: bool,
    at: i64,
) -> Result<Option<Invite>, StoreError> {
    update_record(store, buckets::INVITE, invite_id, |invite: &mut Invite| {
        invite.deleted = deleted;
        invite.last_modified = at;
        Ok::<_, StoreError>(())
    })
    .await
}

/// Applies the present fields of `changes`. A new email must not belong to
/// another live invitation.
pub async fn update_invite(
    store: &Store,
    invite_id: &str,
    changes: &UpdateInvitePayload,
    at: i64,
) -> Result<Option<Invite>> {
    let mut txn = store.begin_write().await?;
    let Some(mut invite) = get_record_in::<Invite>(&mut txn, buckets::INVITE, invite_id).await? else {
        return Ok(None);
    };

    if let Some(email) = &changes.email {
        let email = email.trim().to_lowercase();
        if let Some(other) = find_invite_by_email(store, &email).await? {
            if other.uuid != invite.uuid {
                return Err(Error::AlreadyExists(email));
            }
        }
        invite.email = email;
    }
    if let Some(role) = changes.role {
        invite.role = role;
    }
    if let Some(status) = changes.status {
        invite.status = status;
    }
    invite.last_modified = at;

    put_record_in(&mut txn, buckets::INVITE, &invite.uuid, &invite).await?;
    txn.commit().await?;
    Ok(Some(invite))
}

/// One page of non-deleted invitations, optionally filtered by a search term.
pub async fn list_invites(
    store: &Store,
    term: Option<&str>,
    window: PageWindow,
) -> Result<Vec<Invite>, StoreError> {
    let term = term.map(str::trim).filter(|term| !term.is_empty());
    let invites: Vec<Invite> = list_records(store, buckets::INVITE).await?;
    let matching = invites
        .into_iter()
        .filter(|invite| !invite.deleted)
        .filter(|invite| term.map_or(true, |term| invite.matches_term(term)))
        .take(window.target())
        .collect();
    Ok(window.slice(matching))
}
