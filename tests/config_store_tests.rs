//! Saved-config round trips through the JSON file store.

use boxlink::config::SingBoxConfig;
use boxlink::generator::{AssemblyProfile, ConfigAssembler};
use boxlink::parser::parse_link;
use boxlink::store::{ConfigStore, JsonFileStore, save_named};

fn sample_config() -> SingBoxConfig {
    let links = [
        "vless://id@a.com:443?security=reality&pbk=KEY&sid=ab&type=grpc&serviceName=svc#Reality",
        "hy2://pw@b.com:8443?obfs=salamander&obfs-password=x&alpn=h3,h2#Hy2",
        "vless://id@c.com:80?type=httpupgrade#Bare",
    ];
    let outbounds = links.iter().map(|l| parse_link(l).unwrap()).collect();
    ConfigAssembler::new(AssemblyProfile::default()).assemble(outbounds)
}

#[tokio::test]
async fn test_roundtrip_through_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("boxlink/configs.json");
    let config = sample_config();

    let store = JsonFileStore::new(&path);
    let name = save_named(&store, "  Office VPN ", &config).await.unwrap();
    assert_eq!(name, "Office_VPN");

    // a fresh store instance reads what the first one wrote
    let reopened = JsonFileStore::new(&path);
    let loaded = reopened.get("Office_VPN").await.unwrap().unwrap();
    assert_eq!(loaded, config);
    assert_eq!(
        serde_json::to_value(&loaded).unwrap(),
        serde_json::to_value(&config).unwrap()
    );
}

#[tokio::test]
async fn test_saved_file_is_a_name_keyed_object() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("configs.json");
    let store = JsonFileStore::new(&path);
    store.set("one", &sample_config()).await.unwrap();
    store.set("two", &sample_config()).await.unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let object = raw.as_object().unwrap();
    assert_eq!(object.len(), 2);
    assert_eq!(object["one"]["route"]["final"], "auto_select_proxies");

    assert!(store.delete("one").await.unwrap());
    assert_eq!(store.names().await.unwrap(), vec!["two"]);
}

#[tokio::test]
async fn test_invalid_name_is_rejected_before_writing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("configs.json");
    let store = JsonFileStore::new(&path);
    assert!(save_named(&store, "%%%", &sample_config()).await.is_err());
    assert!(!path.exists());
}
