#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use wheelhouse_indexer::{LinkBase, PageRenderer, build, parse};

/// 퍼저용 구조적 입력
#[derive(Arbitrary, Debug)]
struct FuzzInput {
    /// 버킷 키 목록
    keys: Vec<String>,
    /// 인덱스 루트 경로
    index_prefix: String,
    /// 절대 링크 사용 여부
    absolute: bool,
}

fuzz_target!(|input: FuzzInput| {
    if input.index_prefix.split('/').any(|seg| seg == "..") {
        return;
    }

    let index = build(input.keys.iter().filter_map(|k| parse(k)));
    let link_base = if input.absolute {
        LinkBase::from_base_url(Some("https://wheels.example.com"))
    } else {
        LinkBase::Relative
    };
    let pages = PageRenderer::new(&input.index_prefix, link_base).render(&index);

    // 루트 1개 + 패키지당 1개
    assert_eq!(pages.len(), index.len() + 1);
    for entry in index.packages() {
        assert!(pages.get(&format!("{}/index.html", entry.name())).is_some());
    }
});
