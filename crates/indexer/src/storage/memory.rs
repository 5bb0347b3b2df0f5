//! 인메모리 버킷 -- 테스트와 벤치마크용 [`ObjectStorage`] 구현
//!
//! 키 순서로 정렬된 맵에 오브젝트를 보관하며, 목록 조회 실패, 특정 키 쓰기 실패,
//! 진행하지 않는 페이지네이션을 시뮬레이션할 수 있습니다.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use wheelhouse_core::error::StorageError;

use super::{DEFAULT_PAGE_SIZE, ListPage, ObjectInfo, ObjectStorage, key_under_prefix};

/// 인메모리 오브젝트 스토리지
#[derive(Debug)]
pub struct MemoryStorage {
    /// 키 -> 내용
    objects: Mutex<BTreeMap<String, Bytes>>,
    /// 페이지당 최대 오브젝트 수
    page_size: usize,
    /// 설정 시 모든 목록 조회가 이 사유로 실패
    list_failure: Option<String>,
    /// 쓰기가 실패하는 키 목록
    failing_writes: HashSet<String>,
    /// 첫 페이지의 연속 토큰을 계속 반복
    stalled_pagination: bool,
    /// put_object 호출 횟수 (실패 포함)
    put_calls: AtomicUsize,
    /// list_page 호출 횟수
    list_calls: AtomicUsize,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self {
            objects: Mutex::new(BTreeMap::new()),
            page_size: DEFAULT_PAGE_SIZE,
            list_failure: None,
            failing_writes: HashSet::new(),
            stalled_pagination: false,
            put_calls: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
        }
    }
}

impl MemoryStorage {
    /// 빈 버킷을 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 내용이 비어 있는 오브젝트들로 버킷을 생성합니다.
    pub fn with_keys<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        let storage = Self::new();
        for key in keys {
            storage.insert(key, Bytes::new());
        }
        storage
    }

    /// 오브젝트를 추가합니다.
    pub fn with_object(self, key: impl Into<String>, body: impl Into<Bytes>) -> Self {
        self.insert(key, body);
        self
    }

    /// 페이지 크기를 설정합니다 (최소 1).
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// 모든 목록 조회가 실패하도록 설정합니다.
    pub fn with_list_failure(mut self, reason: impl Into<String>) -> Self {
        self.list_failure = Some(reason.into());
        self
    }

    /// 특정 키에 대한 쓰기가 실패하도록 설정합니다.
    pub fn with_failing_write(mut self, key: impl Into<String>) -> Self {
        self.failing_writes.insert(key.into());
        self
    }

    /// 연속 토큰이 진행하지 않도록 설정합니다.
    pub fn with_stalled_pagination(mut self) -> Self {
        self.stalled_pagination = true;
        self
    }

    /// 오브젝트를 추가하거나 덮어씁니다.
    pub fn insert(&self, key: impl Into<String>, body: impl Into<Bytes>) {
        self.lock().insert(key.into(), body.into());
    }

    /// 저장된 오브젝트 내용을 반환합니다.
    pub fn object(&self, key: &str) -> Option<Bytes> {
        self.lock().get(key).cloned()
    }

    /// 저장된 모든 키를 정렬된 순서로 반환합니다.
    pub fn keys(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    /// 저장된 오브젝트 수
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// 버킷이 비어 있는지 여부
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// put_object 호출 횟수
    pub fn put_count(&self) -> usize {
        self.put_calls.load(Ordering::Relaxed)
    }

    /// list_page 호출 횟수
    pub fn list_count(&self) -> usize {
        self.list_calls.load(Ordering::Relaxed)
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Bytes>> {
        self.objects.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ObjectStorage for MemoryStorage {
    fn location(&self) -> String {
        "memory://".to_owned()
    }

    async fn list_page(
        &self,
        prefix: Option<&str>,
        continuation: Option<&str>,
    ) -> Result<ListPage, StorageError> {
        self.list_calls.fetch_add(1, Ordering::Relaxed);

        if let Some(reason) = &self.list_failure {
            return Err(StorageError::Connection(reason.clone()));
        }

        let objects = self.lock();
        let mut matching = objects
            .iter()
            .filter(|(key, _)| key_under_prefix(key, prefix))
            .filter(|(key, _)| continuation.is_none_or(|token| key.as_str() > token));

        let page: Vec<ObjectInfo> = matching
            .by_ref()
            .take(self.page_size)
            .map(|(key, body)| ObjectInfo {
                key: key.clone(),
                size: body.len() as u64,
                last_modified: None,
            })
            .collect();
        let has_more = matching.next().is_some();

        let continuation = if self.stalled_pagination {
            continuation
                .map(str::to_owned)
                .or_else(|| page.last().map(|o| o.key.clone()))
        } else if has_more {
            page.last().map(|o| o.key.clone())
        } else {
            None
        };

        Ok(ListPage {
            objects: page,
            continuation,
        })
    }

    async fn put_object(&self, key: &str, body: Bytes) -> Result<(), StorageError> {
        self.put_calls.fetch_add(1, Ordering::Relaxed);

        if self.failing_writes.contains(key) {
            return Err(StorageError::Write {
                key: key.to_owned(),
                reason: "simulated write failure".to_owned(),
            });
        }

        self.insert(key, body);
        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<Bytes, StorageError> {
        self.object(key).ok_or_else(|| StorageError::NotFound {
            key: key.to_owned(),
        })
    }
}
