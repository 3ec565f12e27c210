mod common;

use common::Hub;
use system::serde_json::json;
use system::MessageKind;

fn cached_objects(hub: &Hub, session_id: &str) -> system::serde_json::Value {
    let session = hub
        .server
        .state()
        .sessions
        .get(&session_id.to_owned())
        .expect("session must exist");
    json!(session.snapshot.objects)
}

#[test]
fn authoring_tool_and_editor_scenario() {
    let mut hub = Hub::new();
    let a = hub.connect();
    let b = hub.connect();

    hub.join(a, "s1", "blender");
    hub.join(b, "s1", "bisect");

    // B's arrival asks A, and only A, for the scene.
    let to_a = hub.drain(a);
    assert_eq!(
        to_a.iter().map(|e| e.kind.clone()).collect::<Vec<_>>(),
        vec![MessageKind::ClientJoined, MessageKind::SceneRequest]
    );
    assert_eq!(to_a[1].payload["requestedBy"], json!(hub.client_id(b)));
    assert!(hub.drain(b).is_empty());

    hub.send(a, "scene_state", json!({"objects": [{"id": "Cube", "position": [0, 0, 0]}]}));
    assert!(hub.drain(a).is_empty());
    let relayed = hub.take(b);
    assert_eq!(relayed.kind, MessageKind::SceneState);
    assert_eq!(relayed.payload["objects"][0]["id"], "Cube");
    assert_eq!(relayed.payload["_sender"], json!(hub.client_id(a)));
    assert_eq!(relayed.payload["_senderType"], "blender");
    assert_eq!(
        cached_objects(&hub, "s1"),
        json!([{"id": "Cube", "position": [0, 0, 0]}])
    );

    hub.send(b, "transform", json!({"objectId": "Cube", "position": [1, 2, 3]}));
    let transform = hub.take(a);
    assert_eq!(transform.kind, MessageKind::Transform);
    assert_eq!(transform.payload["position"], json!([1, 2, 3]));
    assert!(hub.drain(b).is_empty());

    // transforms are relayed, never folded into the cache
    assert_eq!(cached_objects(&hub, "s1")[0]["position"], json!([0, 0, 0]));
}

#[test]
fn scene_request_is_answered_from_cache_when_it_has_objects() {
    let mut hub = Hub::new();
    let tool = hub.connect();
    let editor = hub.connect();
    let agent = hub.connect();
    hub.join(tool, "s1", "blender");
    hub.send(tool, "scene_state", json!({"objects": [{"id": "Cube"}], "lights": [{"id": "Sun"}]}));
    hub.join(editor, "s1", "bisect");
    hub.join(agent, "s1", "ai");
    hub.drain_all();

    hub.send(agent, "scene_request", json!({}));
    let reply = hub.take(agent);
    assert_eq!(reply.kind, MessageKind::SceneState);
    assert_eq!(reply.payload["objects"], json!([{"id": "Cube"}]));
    assert_eq!(reply.payload["lights"], json!([{"id": "Sun"}]));
    assert!(hub.drain(tool).is_empty());
    assert!(hub.drain(editor).is_empty());
}

#[test]
fn scene_request_goes_to_authoring_tools_when_cache_is_empty() {
    let mut hub = Hub::new();
    let tool = hub.connect();
    let editor = hub.connect();
    let agent = hub.connect();
    hub.join(tool, "s1", "blender");
    hub.join(editor, "s1", "bisect");
    hub.join(agent, "s1", "ai");
    hub.send(tool, "scene_state", json!({"materials": [{"id": "Wood"}]}));
    hub.drain_all();

    hub.send(editor, "scene_request", json!({}));
    assert!(hub.drain(editor).is_empty());
    assert!(hub.drain(agent).is_empty());
    let forwarded = hub.take(tool);
    assert_eq!(forwarded.kind, MessageKind::SceneRequest);
    assert_eq!(forwarded.payload["requestedBy"], json!(hub.client_id(editor)));
    assert_eq!(forwarded.payload["requestedByType"], "bisect");
}

#[test]
fn snapshot_updates_merge_shallowly() {
    let mut hub = Hub::new();
    let tool = hub.connect();
    hub.join(tool, "s1", "blender");

    hub.send(tool, "scene_state", json!({"objects": [{"id": "Cube"}], "selection": ["Cube"]}));
    hub.send(tool, "scene_state", json!({"materials": [{"id": "Wood"}]}));

    let session = hub
        .server
        .state()
        .sessions
        .get(&"s1".to_owned())
        .expect("");
    assert_eq!(json!(session.snapshot.objects), json!([{"id": "Cube"}]));
    assert_eq!(json!(session.snapshot.materials), json!([{"id": "Wood"}]));
    assert_eq!(json!(session.snapshot.selection), json!(["Cube"]));
    assert!(session.snapshot.extra.get("_sender").is_none());
}

#[test]
fn joiner_receives_cached_snapshot() {
    let mut hub = Hub::new();
    let tool = hub.connect();
    let editor = hub.connect();
    hub.join(tool, "s1", "blender");
    hub.send(tool, "scene_state", json!({"objects": [{"id": "Cube"}], "environment": {"hdri": "sky"}}));

    let joined = hub.join(editor, "s1", "bisect");
    assert_eq!(joined.payload["sceneState"]["objects"], json!([{"id": "Cube"}]));
    assert_eq!(joined.payload["sceneState"]["environment"], json!({"hdri": "sky"}));
}

#[test]
fn emptied_session_comes_back_with_empty_snapshot() {
    let mut hub = Hub::new();
    let tool = hub.connect();
    hub.join(tool, "s1", "blender");
    hub.send(tool, "scene_state", json!({"objects": [{"id": "Cube"}]}));
    hub.send(tool, "leave", json!({}));
    assert!(hub.server.state().sessions.get(&"s1".to_owned()).is_none());

    let joined = hub.join(tool, "s1", "blender");
    assert_eq!(joined.payload["sceneState"]["objects"], json!([]));
}
