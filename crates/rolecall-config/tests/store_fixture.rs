use std::fs;

use anyhow::Result;
use rolecall_config::{ConfigDocument, ConfigStore, Transition, UpdateError};
use rolecall_test_support::fixtures::{ALLOWED_ROLE, COMMUNITY, DocumentFixture, sample_document};

#[tokio::test]
async fn committed_update_is_what_a_fresh_open_sees() -> Result<()> {
    let fixture = DocumentFixture::sample()?;
    let store = fixture.open_store().await?;

    let added = store
        .update(|document: &mut ConfigDocument| {
            let added = document.community_entry(COMMUNITY).allow("pilot");
            Ok::<_, String>(Transition::Apply(added))
        })
        .await
        .map_err(|err| anyhow::anyhow!("{err}"))?;
    assert!(added);

    let reopened = ConfigStore::open(fixture.path()).await?;
    assert_eq!(*reopened.read()?, *store.read()?);
    assert_eq!(
        fixture
            .on_disk()?
            .community(COMMUNITY)
            .map(|config| config.allowed_roles().to_vec()),
        Some(vec![ALLOWED_ROLE.to_string(), "pilot".to_string()])
    );
    Ok(())
}

#[tokio::test]
async fn unrelated_fields_survive_a_write() -> Result<()> {
    let fixture = DocumentFixture::sample()?;
    let store = fixture.open_store().await?;

    store
        .update(|document: &mut ConfigDocument| {
            document.community_entry("guild-2").allow("medic");
            Ok::<_, String>(Transition::Apply(()))
        })
        .await
        .map_err(|err| anyhow::anyhow!("{err}"))?;

    let expected = sample_document();
    let on_disk = fixture.on_disk()?;
    assert_eq!(on_disk.connection_secret, expected.connection_secret);
    assert_eq!(on_disk.overlords, expected.overlords);
    assert_eq!(on_disk.faces, expected.faces);
    assert_eq!(on_disk.community(COMMUNITY), expected.community(COMMUNITY));
    Ok(())
}

#[tokio::test]
async fn rejected_transform_reports_its_own_error() -> Result<()> {
    let fixture = DocumentFixture::sample()?;
    let store = fixture.open_store().await?;
    let before = fixture.raw()?;

    let result = store
        .update(|document: &mut ConfigDocument| {
            document.overlords.clear();
            Err::<Transition<()>, _>("refused")
        })
        .await;

    assert!(matches!(result, Err(UpdateError::Rejected("refused"))));
    assert_eq!(fixture.raw()?, before);
    assert!(!store.read()?.overlords.is_empty());
    Ok(())
}

#[tokio::test]
async fn reload_picks_up_edits_made_outside_the_store() -> Result<()> {
    let fixture = DocumentFixture::sample()?;
    let store = fixture.open_store().await?;

    let mut edited = sample_document();
    edited.overlords.push("overlord-2".to_string());
    fs::write(fixture.path(), serde_json::to_string(&edited)?)?;

    assert!(!store.read()?.is_overlord("overlord-2"));
    store.reload().await?;
    assert!(store.read()?.is_overlord("overlord-2"));
    Ok(())
}
