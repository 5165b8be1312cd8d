//! Uploads completing while the document keeps changing

use std::cell::RefCell;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use remirror_core::{DeferredOutcome, ManagerSettings, RemirrorManager};
use remirror_extensions::{Error, UploadExtension, UploadedFile, core_preset, upload_file};
use remirror_model::Selection;
use serde_json::{Value, json};
use tokio::sync::oneshot;

fn manager_with_upload(upload: bool) -> RemirrorManager {
    let mut extensions = core_preset();
    if upload {
        extensions.push(Box::new(UploadExtension::new()));
    }
    let manager = RemirrorManager::create(extensions, ManagerSettings::default()).unwrap();
    manager
        .initialize_with_content(json!({
            "type": "doc",
            "content": [{ "type": "paragraph", "content": [{ "type": "text", "text": "hello world" }] }]
        }))
        .unwrap();
    let mut tr = manager.state().unwrap().tr();
    tr.set_selection(Selection::cursor(6)).unwrap();
    manager.dispatch(tr).unwrap();
    manager
}

fn inline(manager: &RemirrorManager) -> Value {
    manager.state().unwrap().doc().to_json()["content"][0]["content"].clone()
}

fn file(name: &str, url: &str) -> Value {
    json!({ "type": "file", "attrs": { "name": name, "url": url } })
}

type Reply = Result<UploadedFile, String>;

async fn reply(rx: oneshot::Receiver<Reply>) -> Reply {
    rx.await.unwrap_or_else(|_| Err("cancelled".to_string()))
}

#[tokio::test]
async fn test_upload_lands_at_mapped_position() {
    let manager = manager_with_upload(true);
    let (tx, rx) = oneshot::channel();

    let edit = async {
        tokio::task::yield_now().await;
        assert_eq!(manager.pending_deferred(), 1);
        // Typing before the anchor while the upload runs
        let mut tr = manager.state().unwrap().tr();
        tr.insert_text(">> ", 1, 1).unwrap();
        manager.dispatch(tr).unwrap();
        tx.send(Ok(UploadedFile {
            url: "https://cdn.test/cat.png".to_string(),
        }))
        .unwrap();
    };
    let (outcome, ()) = tokio::join!(upload_file(&manager, "cat.png", reply(rx)), edit);

    assert_eq!(outcome.unwrap(), DeferredOutcome::Applied { pos: 9 });
    assert_eq!(
        inline(&manager),
        json!([
            { "type": "text", "text": ">> hello" },
            file("cat.png", "https://cdn.test/cat.png"),
            { "type": "text", "text": " world" }
        ])
    );
    assert_eq!(manager.pending_deferred(), 0);
}

#[tokio::test]
async fn test_upload_dropped_when_anchor_deleted() {
    let manager = manager_with_upload(true);
    let (tx, rx) = oneshot::channel();

    let edit = async {
        tokio::task::yield_now().await;
        let mut tr = manager.state().unwrap().tr();
        tr.delete(2, 8).unwrap();
        manager.dispatch(tr).unwrap();
        tx.send(Ok(UploadedFile {
            url: "https://cdn.test/cat.png".to_string(),
        }))
        .unwrap();
    };
    let (outcome, ()) = tokio::join!(upload_file(&manager, "cat.png", reply(rx)), edit);

    assert_eq!(outcome.unwrap(), DeferredOutcome::Dropped);
    assert_eq!(inline(&manager), json!([{ "type": "text", "text": "horld" }]));
}

#[tokio::test]
async fn test_failed_upload_notifies_handlers() {
    let manager = manager_with_upload(true);
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    manager
        .add_handler("upload", "onUploadFailed", move |payload| {
            sink.borrow_mut().push(payload.clone())
        })
        .unwrap();

    let result = upload_file(&manager, "cat.png", async { Err("quota exceeded".to_string()) }).await;

    assert!(matches!(
        result,
        Err(Error::UploadFailed { ref name, ref reason }) if name == "cat.png" && reason == "quota exceeded"
    ));
    assert_eq!(*seen.borrow(), [json!({ "name": "cat.png", "error": "quota exceeded" })]);
    assert_eq!(manager.pending_deferred(), 0);
    assert_eq!(inline(&manager), json!([{ "type": "text", "text": "hello world" }]));
}

#[tokio::test]
async fn test_upload_requires_extension() {
    let manager = manager_with_upload(false);
    let result = upload_file(&manager, "cat.png", async {
        Ok(UploadedFile {
            url: "https://cdn.test/cat.png".to_string(),
        })
    })
    .await;
    assert!(matches!(result, Err(Error::MissingExtension("upload"))));
}

#[test]
fn test_insert_file_command() {
    let manager = manager_with_upload(true);
    let args = json!({ "url": "https://cdn.test/a.pdf", "name": "a.pdf" });
    assert!(manager.run_command("insertFile", args).unwrap());
    assert_eq!(inline(&manager)[1], file("a.pdf", "https://cdn.test/a.pdf"));
    assert!(!manager.run_command("insertFile", json!({ "name": "no-url" })).unwrap());
}
