#![no_main]

use libfuzzer_sys::fuzz_target;
use wheelhouse_indexer::{normalize_name, parse};

fuzz_target!(|data: &[u8]| {
    if let Ok(key) = std::str::from_utf8(data) {
        if let Some(artifact) = parse(key) {
            // 파싱 결과는 항상 정규화된 비어 있지 않은 이름을 가짐
            assert!(!artifact.package_name.is_empty());
            assert!(!artifact.version.is_empty());
            assert_eq!(normalize_name(&artifact.package_name), artifact.package_name);
            assert!(key.ends_with(&artifact.filename));
            assert_eq!(artifact.raw_key, key);
        }
    }
});
