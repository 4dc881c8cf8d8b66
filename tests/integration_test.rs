use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ntfy_me_hub::{
    FlowActions, ImageRef, JsonAccumulator, MessageTransport, NtfyError, NtfyResult, TargetStore,
    DEFAULT_SLOT,
};
use tempfile::TempDir;

/// 记录发送内容的 mock 传输
struct RecordingTransport {
    sent: Mutex<Vec<(String, Option<String>)>>,
}

impl RecordingTransport {
    fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
        }
    }

    fn sent(&self) -> Vec<(String, Option<String>)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageTransport for RecordingTransport {
    fn name(&self) -> &str {
        "recording"
    }

    async fn send(&self, body: &str, bearer_token: Option<&str>) -> NtfyResult<()> {
        self.sent
            .lock()
            .unwrap()
            .push((body.to_string(), bearer_token.map(String::from)));
        Ok(())
    }
}

#[tokio::test]
async fn test_full_workflow() {
    // 1. 建一个空存储并配对两个目标
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("targets.json");
    let mut store = TargetStore::load(&path).unwrap();

    let first = store.pairing_candidate();
    store.add_target(first);
    let second = store.pairing_candidate();
    assert_eq!(second.id, "ntfy-me-2");
    assert_eq!(second.name, "Ntfy me 2");
    store.add_target(second);

    // 2. 给第一个目标配 token，落盘再读回
    assert!(store.set_token("ntfy-me", "secret"));
    store.save().unwrap();
    let store = TargetStore::load(&path).unwrap();
    assert_eq!(store.targets().len(), 2);

    // 3. 用 mock 传输组装动作层
    let transport = Arc::new(RecordingTransport::new());
    let actions = FlowActions::new(transport.clone(), Arc::new(JsonAccumulator::new()));
    let target = store.find("ntfy-me");

    // 4. 分步拼 JSON payload
    actions.start_json(target, "color", "red").unwrap();
    let payload = actions.build_json(target, "size", "L").unwrap();
    let value: serde_json::Value = serde_json::from_str(&payload).unwrap();
    assert_eq!(value, serde_json::json!({"color": "red", "size": "L"}));

    // 5. 把拼好的 payload 当消息发出去：合法 JSON 必须原样透传
    actions.send_message(target, &payload).await.unwrap();
    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, payload);
    assert_eq!(sent[0].1.as_deref(), Some("secret"));

    // 6. 没有目标时所有动作都拒绝执行
    assert!(matches!(
        actions.send_message(None, "hi").await,
        Err(NtfyError::NoTarget)
    ));
    assert!(matches!(
        actions.start_json(None, "k", "v"),
        Err(NtfyError::NoTarget)
    ));
}

#[tokio::test]
async fn test_accumulator_state_survives_host_restart() {
    // 模拟 CLI 宿主：每次调用都重建动作层，槽位经由存储文件传递
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("targets.json");

    let mut store = TargetStore::load(&path).unwrap();
    store.add_target(store.pairing_candidate());
    store.save().unwrap();

    // 第一次调用：start-json
    {
        let mut store = TargetStore::load(&path).unwrap();
        let actions = FlowActions::new(
            Arc::new(RecordingTransport::new()),
            Arc::new(JsonAccumulator::with_slots(store.slots().clone())),
        );
        let target_id = store.targets()[0].id.clone();
        let target = store.find(&target_id).cloned();
        actions
            .start_json(target.as_ref(), "color", "red")
            .unwrap();
        store.set_slots(actions.accumulator().snapshot());
        store.save().unwrap();
    }

    // 第二次调用：build-json 接着上次的状态拼
    {
        let mut store = TargetStore::load(&path).unwrap();
        let actions = FlowActions::new(
            Arc::new(RecordingTransport::new()),
            Arc::new(JsonAccumulator::with_slots(store.slots().clone())),
        );
        let target = store.targets().first().cloned();
        let payload = actions
            .build_json(target.as_ref(), "size", "L")
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(value, serde_json::json!({"color": "red", "size": "L"}));
        store.set_slots(actions.accumulator().snapshot());
        store.save().unwrap();
    }

    // start-json 丢弃之前的键
    {
        let store = TargetStore::load(&path).unwrap();
        let actions = FlowActions::new(
            Arc::new(RecordingTransport::new()),
            Arc::new(JsonAccumulator::with_slots(store.slots().clone())),
        );
        let target = store.targets().first().cloned();
        let payload = actions.start_json(target.as_ref(), "x", "y").unwrap();
        let value: serde_json::Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(value, serde_json::json!({"x": "y"}));
    }
}

#[tokio::test]
async fn test_build_recovers_from_corrupt_persisted_slot() {
    // 存储里的槽位被写坏时，build 按空对象继续而不是报错
    let mut slots = HashMap::new();
    slots.insert(DEFAULT_SLOT.to_string(), "{broken".to_string());

    let actions = FlowActions::new(
        Arc::new(RecordingTransport::new()),
        Arc::new(JsonAccumulator::with_slots(slots)),
    );

    let dir = TempDir::new().unwrap();
    let mut store = TargetStore::load(dir.path().join("targets.json")).unwrap();
    store.add_target(store.pairing_candidate());
    let target = store.targets().first().cloned();

    let payload = actions.build_json(target.as_ref(), "k", "v").unwrap();
    let value: serde_json::Value = serde_json::from_str(&payload).unwrap();
    assert_eq!(value, serde_json::json!({"k": "v"}));
}

#[tokio::test]
async fn test_image_workflow_with_json_caption() {
    let transport = Arc::new(RecordingTransport::new());
    let actions = FlowActions::new(transport.clone(), Arc::new(JsonAccumulator::new()));

    let dir = TempDir::new().unwrap();
    let mut store = TargetStore::load(dir.path().join("targets.json")).unwrap();
    store.add_target(store.pairing_candidate());
    let target = store.targets().first().cloned();

    actions
        .send_image(
            target.as_ref(),
            ImageRef::from_bytes(vec![0x01, 0x02]),
            r#"{"flow":"x"}"#,
        )
        .await
        .unwrap();

    let sent = transport.sent();
    let value: serde_json::Value = serde_json::from_str(&sent[0].0).unwrap();
    assert_eq!(value["topic"], "homey-image");
    assert_eq!(value["image"], "AQI=");
    assert_eq!(value["flow"], "x");
    assert!(value.get("msg").is_none());
}
