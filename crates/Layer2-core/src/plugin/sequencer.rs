//! Sequencer - 의존성 기반 실행 순서 계산
//!
//! 각 유닛이 선언한 의존성 이름을 따라 DFS 로 방문하며, 의존 대상이 모두
//! 앞에 오도록 순서를 만듭니다. 순환 의존성은 누락된 의존성과 동일하게
//! 취급합니다 (올바른 순서가 존재하지 않음).

use std::collections::HashMap;

/// 순서 계산 결과
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sequence {
    /// 의존성 순서로 정렬된 유닛 이름
    pub sequence: Vec<String>,

    /// 찾을 수 없거나 순환에 걸린 유닛 이름 (중복 없음)
    pub missing_tasks: Vec<String>,

    /// 발견된 순환 경로 (진단용, 예: `["a", "b", "a"]`)
    pub recursive_dependencies: Vec<Vec<String>>,
}

impl Sequence {
    /// 누락/순환 없이 모든 유닛이 정렬되었는지
    pub fn is_complete(&self) -> bool {
        self.missing_tasks.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done { emitted: bool },
}

struct Walker<'a, D> {
    units: &'a HashMap<String, D>,
    marks: HashMap<&'a str, Mark>,
    path: Vec<&'a str>,
    result: Sequence,
}

impl<'a, D: AsRef<[String]>> Walker<'a, D> {
    fn push_missing(&mut self, name: &str) {
        if !self.result.missing_tasks.iter().any(|m| m == name) {
            self.result.missing_tasks.push(name.to_string());
        }
    }

    /// 유닛을 방문하고 sequence 에 포함되었는지 반환
    fn visit(&mut self, name: &'a str) -> bool {
        match self.marks.get(name).copied() {
            Some(Mark::Done { emitted }) => return emitted,
            Some(Mark::Visiting) => {
                let start = self.path.iter().position(|n| *n == name).unwrap_or(0);
                let mut cycle: Vec<String> =
                    self.path[start..].iter().map(|n| n.to_string()).collect();
                cycle.push(name.to_string());
                self.result.recursive_dependencies.push(cycle);
                self.push_missing(name);
                return false;
            }
            None => {}
        }

        let units = self.units;
        let Some((key, deps)) = units.get_key_value(name) else {
            self.push_missing(name);
            return false;
        };
        let key = key.as_str();

        self.marks.insert(key, Mark::Visiting);
        self.path.push(key);

        let mut satisfied = true;
        for dep in deps.as_ref() {
            if !self.visit(dep.as_str()) {
                satisfied = false;
            }
        }

        self.path.pop();
        if satisfied {
            self.result.sequence.push(key.to_string());
        }
        self.marks.insert(key, Mark::Done { emitted: satisfied });
        satisfied
    }
}

/// 의존성 순서 계산
///
/// - `units`: 이름 → 의존성 이름 목록
/// - `names`: 정렬할 이름 (요청 순서가 동률일 때의 순서가 됨)
///
/// 의존성이 누락되었거나 순환에 걸린 유닛은 `sequence` 에서 제외되고,
/// 그 유닛에 의존하는 유닛도 함께 제외됩니다.
pub fn sequencify<'a, D, I>(units: &'a HashMap<String, D>, names: I) -> Sequence
where
    D: AsRef<[String]>,
    I: IntoIterator<Item = &'a str>,
{
    let mut walker = Walker {
        units,
        marks: HashMap::new(),
        path: Vec::new(),
        result: Sequence::default(),
    };

    for name in names {
        walker.visit(name);
    }

    walker.result
}
