use sdkgen_core::error::TransformError;
use sdkgen_core::ir::HttpMethod;
use sdkgen_core::transform::{NameRegistry, normalize, route_to_name};

#[test]
fn spellings_of_one_name_agree() {
    for raw in ["Chunk Group", "chunk-group", "chunk_group", "chunkGroup", "ChunkGroup"] {
        let name = normalize(raw);
        assert_eq!(name.type_name, "ChunkGroup", "type name for {raw:?}");
        assert_eq!(name.member_name, "chunk_group", "member name for {raw:?}");
        assert_eq!(name.original, raw);
    }
}

#[test]
fn header_names() {
    let name = normalize("TR-Dataset");
    assert_eq!(name.type_name, "TrDataset");
    assert_eq!(name.member_name, "tr_dataset");

    let name = normalize("X-API-Version");
    assert_eq!(name.type_name, "XApiVersion");
    assert_eq!(name.member_name, "x_api_version");
}

#[test]
fn operation_ids() {
    assert_eq!(normalize("createChunkGroup").member_name, "create_chunk_group");
    assert_eq!(normalize("get_chunk_by_id").type_name, "GetChunkById");
}

#[test]
fn leading_digit_and_empty_input() {
    assert_eq!(normalize("2fa").member_name, "_2fa");
    assert_eq!(normalize("--").member_name, "unnamed");
}

#[test]
fn accented_names_keep_their_letters() {
    let name = normalize("Crème Brûlée");
    assert_eq!(name.member_name, "crème_brûlée");
    assert_eq!(name.type_name, "CrèmeBrûlée");
    // Still distinct from the unaccented spelling.
    assert_ne!(normalize("Café").member_name, normalize("Caf").member_name);
}

#[test]
fn names_from_routes() {
    assert_eq!(route_to_name(HttpMethod::Get, "/chunks"), "listChunks");
    assert_eq!(route_to_name(HttpMethod::Get, "/chunks/{chunk_id}"), "getChunk");
    assert_eq!(
        route_to_name(HttpMethod::Post, "/chunk_group/{group_id}/chunks"),
        "createChunkGroupChunks"
    );
    assert_eq!(
        route_to_name(HttpMethod::Delete, "/categories/{id}"),
        "deleteCategory"
    );
}

#[test]
fn reserved_words_get_a_suffix() {
    let mut names = NameRegistry::new(["from", "self"]);
    let binding = names.bind("op", "from").expect("should bind");
    assert_eq!(binding.member_name, "from_");
    assert_eq!(binding.original, "from");

    let binding = names.bind("op", "to").expect("should bind");
    assert_eq!(binding.member_name, "to");
}

#[test]
fn collisions_within_a_scope_are_errors() {
    let mut names = NameRegistry::default();
    names.bind("params", "chunk-id").expect("should bind");
    // Re-binding the same key is idempotent.
    names.bind("params", "chunk-id").expect("should rebind");

    let err = names.bind("params", "chunk_id").unwrap_err();
    assert!(matches!(
        err,
        TransformError::NameCollision { ref identifier, .. } if identifier == "chunk_id"
    ));

    // Other scopes are independent.
    names.bind("other", "chunk_id").expect("should bind elsewhere");
}
