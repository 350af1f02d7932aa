//! Reference validation for note writes.
//!
//! A note may only point at a folder and tags owned by the note's owner.
//! Missing and foreign-owned references fail identically so that the
//! existence of another user's folder or tag is never revealed.

use tracing::debug;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::NoteDraft;
use crate::traits::{FolderRepository, TagRepository};

/// Confirm `folder_id` (if any) names a folder owned by `user_id`.
pub async fn validate_folder(
    folders: &dyn FolderRepository,
    user_id: Uuid,
    folder_id: Option<Uuid>,
) -> Result<()> {
    let Some(folder_id) = folder_id else {
        return Ok(());
    };

    if folders.exists_owned(user_id, folder_id).await? {
        Ok(())
    } else {
        debug!(
            subsystem = "core",
            component = "validation",
            op = "validate_folder",
            %user_id,
            %folder_id,
            "Rejected folder reference"
        );
        Err(Error::InvalidFolder(folder_id.to_string()))
    }
}

/// Confirm every id in `tag_ids` names a tag owned by `user_id`.
///
/// `tag_ids` must be distinct; the check compares the number of owned
/// matches against the number requested.
pub async fn validate_tags(
    tags: &dyn TagRepository,
    user_id: Uuid,
    tag_ids: &[Uuid],
) -> Result<()> {
    if tag_ids.is_empty() {
        return Ok(());
    }

    let owned = tags.count_owned(user_id, tag_ids).await?;
    if owned == tag_ids.len() {
        Ok(())
    } else {
        debug!(
            subsystem = "core",
            component = "validation",
            op = "validate_tags",
            %user_id,
            requested = tag_ids.len(),
            owned,
            "Rejected tag references"
        );
        Err(Error::InvalidTag(
            tag_ids.iter().map(Uuid::to_string).collect(),
        ))
    }
}

/// Run both checks concurrently; succeed only if both do.
pub async fn validate_references(
    folders: &dyn FolderRepository,
    tags: &dyn TagRepository,
    user_id: Uuid,
    draft: &NoteDraft,
) -> Result<()> {
    tokio::try_join!(
        validate_folder(folders, user_id, draft.folder_id),
        validate_tags(tags, user_id, &draft.tags),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockStore;
    use crate::uuid_utils::new_v7;

    fn draft(folder_id: Option<Uuid>, tags: Vec<Uuid>) -> NoteDraft {
        NoteDraft {
            title: "cats cats cats".to_string(),
            content: "purr purr purr".to_string(),
            folder_id,
            tags,
        }
    }

    #[tokio::test]
    async fn test_no_folder_is_ok() {
        let store = MockStore::new();
        assert!(validate_folder(&store, new_v7(), None).await.is_ok());
    }

    #[tokio::test]
    async fn test_owned_folder_is_ok() {
        let store = MockStore::new();
        let user = new_v7();
        let folder = store.seed_folder(user, "Archive");
        assert!(validate_folder(&store, user, Some(folder.id)).await.is_ok());
    }

    #[tokio::test]
    async fn test_foreign_folder_is_invalid() {
        let store = MockStore::new();
        let owner = new_v7();
        let folder = store.seed_folder(owner, "Archive");
        let err = validate_folder(&store, new_v7(), Some(folder.id))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidFolder(_)));
    }

    #[tokio::test]
    async fn test_unknown_folder_is_invalid() {
        let store = MockStore::new();
        let err = validate_folder(&store, new_v7(), Some(new_v7()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidFolder(_)));
    }

    #[tokio::test]
    async fn test_empty_tags_is_ok() {
        let store = MockStore::new();
        assert!(validate_tags(&store, new_v7(), &[]).await.is_ok());
    }

    #[tokio::test]
    async fn test_multiple_owned_tags_ok() {
        let store = MockStore::new();
        let user = new_v7();
        let a = store.seed_tag(user, "breed");
        let b = store.seed_tag(user, "hybrid");
        let c = store.seed_tag(user, "domestic");
        assert!(validate_tags(&store, user, &[a.id, b.id, c.id]).await.is_ok());
    }

    #[tokio::test]
    async fn test_one_valid_one_foreign_tag_is_invalid() {
        let store = MockStore::new();
        let user = new_v7();
        let mine = store.seed_tag(user, "breed");
        let theirs = store.seed_tag(new_v7(), "breed");
        let err = validate_tags(&store, user, &[mine.id, theirs.id])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTag(ref ids) if ids.len() == 2));
    }

    #[tokio::test]
    async fn test_all_foreign_tags_is_invalid() {
        let store = MockStore::new();
        let other = new_v7();
        let ids: Vec<Uuid> = ["a", "b", "c"]
            .iter()
            .map(|n| store.seed_tag(other, n).id)
            .collect();
        assert!(validate_tags(&store, new_v7(), &ids).await.is_err());
    }

    #[tokio::test]
    async fn test_references_require_both() {
        let store = MockStore::new();
        let user = new_v7();
        let folder = store.seed_folder(user, "Archive");
        let tag = store.seed_tag(user, "breed");

        assert!(
            validate_references(&store, &store, user, &draft(Some(folder.id), vec![tag.id]))
                .await
                .is_ok()
        );

        let bad_tag = validate_references(
            &store,
            &store,
            user,
            &draft(Some(folder.id), vec![new_v7()]),
        )
        .await
        .unwrap_err();
        assert!(matches!(bad_tag, Error::InvalidTag(_)));

        let bad_folder =
            validate_references(&store, &store, user, &draft(Some(new_v7()), vec![tag.id]))
                .await
                .unwrap_err();
        assert!(matches!(bad_folder, Error::InvalidFolder(_)));
    }
}
