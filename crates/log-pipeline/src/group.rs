//! 배치 그룹화 -- 분류된 레코드를 변형별, 그룹화 키별로 나눕니다.
//!
//! 호스트 기반 변형(액세스 로그)은 첫 등장 순서대로 중복 제거한 호스트마다
//! 그룹 하나를 만들고, 나머지 변형은 모든 레코드를 담은 그룹 하나를 만듭니다.
//! 레코드가 없는 변형은 그룹을 만들지 않으므로 빈 그룹은 존재하지 않습니다.

use std::collections::HashSet;

use crate::record::{ClassifiedRecord, RecordKind};

/// 같은 변형, 같은 그룹화 키를 가진 레코드 묶음 (항상 비어 있지 않음)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    /// 변형
    pub kind: RecordKind,
    /// 그룹화 키 (호스트, 비그룹 변형은 빈 문자열)
    pub key: String,
    /// 원래 순서를 유지한 레코드
    pub records: Vec<ClassifiedRecord>,
}

impl Group {
    /// 아카이브 키에 붙일 그룹화 키 (비그룹 변형은 `None`)
    pub fn archive_group_key(&self) -> Option<&str> {
        if self.kind.is_grouped_by_host() {
            Some(self.key.as_str())
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// 한 변형의 레코드와 그룹
#[derive(Debug, Clone)]
pub struct VariantBatch {
    /// 변형
    pub kind: RecordKind,
    /// 배치 순서를 유지한 변형의 전체 레코드 (알림 평가용)
    pub records: Vec<ClassifiedRecord>,
    /// 그룹 (아카이브/색인 단위)
    pub groups: Vec<Group>,
}

/// 호출 하나의 그룹화 결과
#[derive(Debug, Clone, Default)]
pub struct GroupedBatch {
    /// 처리 순서대로 정렬된 변형 배치 (레코드가 있는 변형만)
    pub variants: Vec<VariantBatch>,
}

impl GroupedBatch {
    /// 분류된 레코드를 그룹화합니다.
    pub fn from_records(records: Vec<ClassifiedRecord>) -> Self {
        let mut variants = Vec::new();
        for kind in RecordKind::PROCESSING_ORDER {
            let of_kind: Vec<ClassifiedRecord> = records
                .iter()
                .filter(|r| r.kind() == kind)
                .cloned()
                .collect();
            if of_kind.is_empty() {
                continue;
            }
            let groups = group_records(kind, &of_kind);
            variants.push(VariantBatch {
                kind,
                records: of_kind,
                groups,
            });
        }
        Self { variants }
    }

    /// 특정 변형의 배치를 찾습니다.
    pub fn variant(&self, kind: RecordKind) -> Option<&VariantBatch> {
        self.variants.iter().find(|v| v.kind == kind)
    }

    /// 전체 그룹 수
    pub fn group_count(&self) -> usize {
        self.variants.iter().map(|v| v.groups.len()).sum()
    }
}

fn group_records(kind: RecordKind, records: &[ClassifiedRecord]) -> Vec<Group> {
    if !kind.is_grouped_by_host() {
        return vec![Group {
            kind,
            key: String::new(),
            records: records.to_vec(),
        }];
    }

    let hosts = distinct_in_order(records.iter().map(ClassifiedRecord::group_key));
    hosts
        .into_iter()
        .map(|host| Group {
            kind,
            records: records
                .iter()
                .filter(|r| r.group_key() == host)
                .cloned()
                .collect(),
            key: host.to_owned(),
        })
        .collect()
}

/// 첫 등장 순서를 유지하며 중복을 제거합니다.
fn distinct_in_order<'a>(values: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    values.filter(|v| seen.insert(*v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{AccessLog, ApplicationLog, NginxErrorLog};

    fn access(host: &str, uri: &str) -> ClassifiedRecord {
        ClassifiedRecord::Access(AccessLog {
            host: host.to_owned(),
            request_uri: uri.to_owned(),
            ..Default::default()
        })
    }

    fn app(message: &str) -> ClassifiedRecord {
        ClassifiedRecord::Application(ApplicationLog {
            message: message.to_owned(),
            ..Default::default()
        })
    }

    #[test]
    fn two_hosts_make_two_groups() {
        let batch = GroupedBatch::from_records(vec![
            access("a.example", "/1"),
            access("b.example", "/2"),
            access("a.example", "/3"),
        ]);
        let variant = batch.variant(RecordKind::Access).unwrap();
        assert_eq!(variant.groups.len(), 2);

        let a = &variant.groups[0];
        assert_eq!(a.key, "a.example");
        assert_eq!(a.archive_group_key(), Some("a.example"));
        assert_eq!(a.records, vec![access("a.example", "/1"), access("a.example", "/3")]);

        let b = &variant.groups[1];
        assert_eq!(b.key, "b.example");
        assert_eq!(b.records, vec![access("b.example", "/2")]);
    }

    #[test]
    fn ungrouped_variant_is_single_group_in_order() {
        let batch = GroupedBatch::from_records(vec![app("1"), app("2"), app("3")]);
        let variant = batch.variant(RecordKind::Application).unwrap();
        assert_eq!(variant.groups.len(), 1);
        assert_eq!(variant.groups[0].key, "");
        assert_eq!(variant.groups[0].archive_group_key(), None);
        assert_eq!(variant.groups[0].records, vec![app("1"), app("2"), app("3")]);
    }

    #[test]
    fn absent_variants_produce_no_groups() {
        let batch = GroupedBatch::from_records(vec![app("only")]);
        assert!(batch.variant(RecordKind::Access).is_none());
        assert!(batch.variant(RecordKind::NginxError).is_none());
        assert_eq!(batch.group_count(), 1);

        let empty = GroupedBatch::from_records(Vec::new());
        assert!(empty.variants.is_empty());
    }

    #[test]
    fn variants_follow_processing_order() {
        let batch = GroupedBatch::from_records(vec![
            ClassifiedRecord::NginxError(NginxErrorLog::default()),
            app("x"),
            access("h", "/"),
        ]);
        let kinds: Vec<RecordKind> = batch.variants.iter().map(|v| v.kind).collect();
        assert_eq!(
            kinds,
            vec![RecordKind::Access, RecordKind::Application, RecordKind::NginxError]
        );
    }

    #[test]
    fn no_group_is_ever_empty() {
        let batch = GroupedBatch::from_records(vec![
            access("", "/"),
            access("h", "/"),
            app("x"),
        ]);
        for variant in &batch.variants {
            for group in &variant.groups {
                assert!(!group.is_empty());
            }
        }
    }
}
