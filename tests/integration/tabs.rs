//! Tab lifecycle and the dirty-close protocol.

use crate::common::open_sample;
use vellum::interaction::SaveChoice;

#[tokio::test]
async fn clean_tab_closes_immediately() {
    let mut h = open_sample().await;
    let tab = h.ws.open_file("/root/readme.md").await.unwrap();
    assert!(h.ws.close_tab(tab).await.unwrap());
    assert!(h.ws.tabs().is_empty());
}

#[tokio::test]
async fn open_file_reactivates_existing_tab() {
    let mut h = open_sample().await;
    let first = h.ws.open_file("/root/readme.md").await.unwrap();
    let second = h.ws.open_file("/root/docs/a.md").await.unwrap();
    assert_eq!(h.ws.tabs().active(), Some(second));

    let again = h.ws.open_file("/root/readme.md").await.unwrap();
    assert_eq!(again, first);
    assert_eq!(h.ws.tabs().len(), 2);
    assert_eq!(h.ws.tabs().active(), Some(first));
}

#[tokio::test]
async fn cancelled_close_keeps_tab_unmodified() {
    let mut h = open_sample().await;
    let tab = h.ws.open_file("/root/readme.md").await.unwrap();
    h.ws.update_tab_content(tab, "edited".to_string());

    h.interaction.push_save_choice(SaveChoice::Cancel);
    assert!(!h.ws.close_tab(tab).await.unwrap());

    let kept = h.ws.tabs().get(tab).unwrap();
    assert!(kept.is_dirty);
    assert_eq!(kept.content, "edited");
    assert_eq!(kept.path.as_deref(), Some("/root/readme.md"));
}

#[tokio::test]
async fn dont_save_discards_and_closes() {
    let mut h = open_sample().await;
    let tab = h.ws.open_file("/root/readme.md").await.unwrap();
    h.ws.update_tab_content(tab, "edited".to_string());

    h.interaction.push_save_choice(SaveChoice::DontSave);
    assert!(h.ws.close_tab(tab).await.unwrap());
    assert!(h.ws.tabs().get(tab).is_none());
    // The discarded edit never reached disk.
    assert_eq!(h.gateway.content_of("/root/readme.md").unwrap(), "# readme\n");
}

#[tokio::test]
async fn failed_save_aborts_the_close() {
    let mut h = open_sample().await;
    let tab = h.ws.open_file("/root/readme.md").await.unwrap();
    h.ws.update_tab_content(tab, "edited".to_string());

    h.interaction.push_save_choice(SaveChoice::Save);
    h.gateway.fail_next_operation("disk full");
    assert!(!h.ws.close_tab(tab).await.unwrap());

    let kept = h.ws.tabs().get(tab).unwrap();
    assert!(kept.is_dirty);
    assert_eq!(kept.content, "edited");
}

#[tokio::test]
async fn save_then_close_writes_through_the_gateway() {
    let mut h = open_sample().await;
    let tab = h.ws.open_file("/root/readme.md").await.unwrap();
    h.ws.update_tab_content(tab, "edited".to_string());

    h.interaction.push_save_choice(SaveChoice::Save);
    assert!(h.ws.close_tab(tab).await.unwrap());
    assert!(h.ws.tabs().get(tab).is_none());
    assert_eq!(h.gateway.content_of("/root/readme.md").unwrap(), "edited");
}

#[tokio::test]
async fn pathless_save_goes_through_the_picker() {
    let mut h = open_sample().await;
    let tab = h.ws.new_tab();
    h.ws.update_tab_content(tab, "fresh words".to_string());

    // Dismissed picker aborts the save, tab stays dirty.
    assert!(!h.ws.save_tab(tab, false).await.unwrap());
    assert!(h.ws.tabs().get(tab).unwrap().is_dirty);

    h.interaction.push_save_path(Some("/root/drafts.md"));
    assert!(h.ws.save_tab(tab, false).await.unwrap());
    let saved = h.ws.tabs().get(tab).unwrap();
    assert_eq!(saved.path.as_deref(), Some("/root/drafts.md"));
    assert_eq!(saved.name, "drafts.md");
    assert!(!saved.is_dirty);
    assert_eq!(h.gateway.content_of("/root/drafts.md").unwrap(), "fresh words");
}

#[tokio::test]
async fn untitled_tabs_number_from_the_registry_counter() {
    let mut h = open_sample().await;
    let first = h.ws.new_tab();
    let second = h.ws.new_tab();
    assert_eq!(h.ws.tabs().get(first).unwrap().name, "Untitled-01.md");
    assert_eq!(h.ws.tabs().get(second).unwrap().name, "Untitled-02.md");
    assert!(h.ws.tabs().get(second).unwrap().is_active);
}

#[tokio::test]
async fn close_all_stops_at_first_abort() {
    let mut h = open_sample().await;
    let a = h.ws.open_file("/root/docs/a.md").await.unwrap();
    let b = h.ws.open_file("/root/docs/b.md").await.unwrap();
    let c = h.ws.open_file("/root/readme.md").await.unwrap();
    h.ws.update_tab_content(b, "dirty".to_string());

    // The dirty middle tab aborts the batch; the clean first tab is already
    // closed, the later tab is untouched.
    h.interaction.push_save_choice(SaveChoice::Cancel);
    assert!(!h.ws.close_all_tabs().await.unwrap());
    assert!(h.ws.tabs().get(a).is_none());
    assert!(h.ws.tabs().get(b).is_some());
    assert!(h.ws.tabs().get(c).is_some());
}

#[tokio::test]
async fn aborted_close_all_keeps_folder_open() {
    let mut h = open_sample().await;
    let tab = h.ws.open_file("/root/docs/a.md").await.unwrap();
    h.ws.update_tab_content(tab, "dirty".to_string());

    h.interaction.push_save_choice(SaveChoice::Cancel);
    assert!(!h.ws.close_folder().await.unwrap());
    assert!(h.ws.tree().is_some());
    assert_eq!(h.ws.root(), Some("/root"));
}

#[tokio::test]
async fn save_all_handles_pathed_then_pathless() {
    let mut h = open_sample().await;
    let pathed = h.ws.open_file("/root/docs/a.md").await.unwrap();
    let pathless = h.ws.new_tab();
    h.ws.update_tab_content(pathed, "pathed edit".to_string());
    h.ws.update_tab_content(pathless, "pathless edit".to_string());

    h.interaction.push_save_path(Some("/root/untitled-save.md"));
    assert!(h.ws.save_all_tabs().await.unwrap());
    assert_eq!(h.gateway.content_of("/root/docs/a.md").unwrap(), "pathed edit");
    assert_eq!(
        h.gateway.content_of("/root/untitled-save.md").unwrap(),
        "pathless edit"
    );
    assert!(h.ws.tabs().iter().all(|t| !t.is_dirty));
}
