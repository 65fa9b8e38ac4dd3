//! Version - semver 범위 매칭
//!
//! 플러그인 메타데이터의 `engines.lowcodeEngine` 범위를 호스트 버전과 비교합니다.
//! npm 스타일 범위(`^2.0.0`, `>=1.0.0 <2.0.0`, `1.0.0 - 2.0.0`, `a || b`)를 받아
//! `semver::VersionReq` 로 변환합니다.
//!
//! ## Pre-release 포함 매칭
//!
//! `semver` 크레이트는 기본적으로 같은 `major.minor.patch` 의 비교자에서만
//! pre-release 버전을 허용합니다. 여기서는 pre-release 를 일반 버전과 동일하게
//! 취급합니다. 범위에서 유도된 경계(`^`, `~`, `*`, 부분 버전)는 해당 버전의 가장
//! 낮은 pre-release(`X.Y.Z-0`)를 경계로 사용하므로 `2.1.0-beta` 는 `^2.0.0` 을
//! 만족하고 `3.0.0-beta` 는 만족하지 않습니다.

use crate::{Error, Result};
use semver::{Comparator, Op, Version, VersionReq};

/// 범위 문자열이 버전 문자열을 만족하는지 확인 (pre-release 포함)
pub fn satisfies(range: &str, version: &str) -> Result<bool> {
    let version = parse_version(version)?;
    let alternatives = parse_range(range)?;
    Ok(alternatives
        .iter()
        .any(|req| matches_including_prerelease(req, &version)))
}

/// 버전 파싱 (`v` / `=` 접두사 허용)
pub fn parse_version(version: &str) -> Result<Version> {
    let trimmed = version.trim().trim_start_matches(['v', '=']);
    Version::parse(trimmed)
        .map_err(|e| Error::Configuration(format!("Invalid version '{}': {}", version, e)))
}

/// npm 스타일 범위 파싱. `||` 로 나뉜 각 대안을 하나의 `VersionReq` 로 반환
pub fn parse_range(range: &str) -> Result<Vec<VersionReq>> {
    range
        .split("||")
        .map(|alternative| {
            let normalized = normalize_alternative(alternative);
            VersionReq::parse(&normalized)
                .map_err(|e| Error::Configuration(format!("Invalid range '{}': {}", range, e)))
        })
        .collect()
}

/// 모든 비교자를 pre-release 포함 규칙으로 평가
pub fn matches_including_prerelease(req: &VersionReq, version: &Version) -> bool {
    req.comparators
        .iter()
        .all(|cmp| comparator_matches(cmp, version))
}

// ============================================================================
// 범위 정규화
// ============================================================================

/// 공백 구분 비교자를 쉼표 구분으로, 하이픈 범위를 `>=a, <=b` 로 변환
fn normalize_alternative(alternative: &str) -> String {
    let tokens: Vec<&str> = alternative.split_whitespace().collect();
    if tokens.is_empty() {
        return "*".to_string();
    }

    if tokens.len() == 3 && tokens[1] == "-" {
        return format!(">={}, <={}", tokens[0], tokens[2]);
    }

    let mut parts: Vec<String> = Vec::new();
    let mut pending_op: Option<&str> = None;
    for token in tokens {
        let token = token.trim_end_matches(',');
        if token.is_empty() {
            continue;
        }
        if token.chars().all(|c| matches!(c, '<' | '>' | '=' | '~' | '^')) {
            pending_op = Some(token);
            continue;
        }
        match pending_op.take() {
            Some(op) => parts.push(format!("{}{}", op, token)),
            None => parts.push(bare_to_exact(token)),
        }
    }
    parts.join(", ")
}

/// npm 에서 연산자 없는 완전한 버전은 정확히 일치를 의미 (`semver` 기본값은 `^`)
fn bare_to_exact(token: &str) -> String {
    let token = token.strip_prefix('v').unwrap_or(token);
    let starts_with_digit = token.chars().next().is_some_and(|c| c.is_ascii_digit());
    let core = token.split(['-', '+']).next().unwrap_or(token);
    let is_full = core.split('.').count() == 3
        && !core.contains(|c: char| matches!(c, 'x' | 'X' | '*'));

    if starts_with_digit && is_full {
        format!("={}", token)
    } else {
        token.to_string()
    }
}

// ============================================================================
// 비교자 평가
// ============================================================================

type Triple = (u64, u64, u64);

fn triple(version: &Version) -> Triple {
    (version.major, version.minor, version.patch)
}

/// 비교자 버전 (build metadata 제외)
fn comparator_version(cmp: &Comparator) -> Version {
    let mut version = Version::new(cmp.major, cmp.minor.unwrap_or(0), cmp.patch.unwrap_or(0));
    version.pre = cmp.pre.clone();
    version
}

/// 부분 버전의 다음 경계 (`2` → `3.0.0`, `2.1` → `2.2.0`)
fn next_partial(cmp: &Comparator) -> Triple {
    match (cmp.minor, cmp.patch) {
        (None, _) => (cmp.major + 1, 0, 0),
        (Some(minor), None) => (cmp.major, minor + 1, 0),
        (Some(minor), Some(patch)) => (cmp.major, minor, patch + 1),
    }
}

/// 하한 검사: 명시적 pre-release 가 있으면 그 버전, 없으면 `X.Y.Z-0`
fn at_least_floor(cmp: &Comparator, version: &Version) -> bool {
    if cmp.pre.is_empty() {
        triple(version) >= triple(&comparator_version(cmp))
    } else {
        *version >= comparator_version(cmp)
    }
}

fn comparator_matches(cmp: &Comparator, version: &Version) -> bool {
    let mut version = version.clone();
    version.build = semver::BuildMetadata::EMPTY;
    let is_full = cmp.minor.is_some() && cmp.patch.is_some();

    match cmp.op {
        Op::Exact | Op::Wildcard if is_full => version == comparator_version(cmp),
        Op::Exact | Op::Wildcard => {
            at_least_floor(cmp, &version) && triple(&version) < next_partial(cmp)
        }
        Op::Greater if is_full => version > comparator_version(cmp),
        Op::Greater => triple(&version) >= next_partial(cmp),
        Op::GreaterEq if is_full => version >= comparator_version(cmp),
        Op::GreaterEq => at_least_floor(cmp, &version),
        Op::Less if is_full => version < comparator_version(cmp),
        Op::Less => triple(&version) < triple(&comparator_version(cmp)),
        Op::LessEq if is_full => version <= comparator_version(cmp),
        Op::LessEq => triple(&version) < next_partial(cmp),
        Op::Tilde => {
            let upper = match cmp.minor {
                Some(minor) => (cmp.major, minor + 1, 0),
                None => (cmp.major + 1, 0, 0),
            };
            at_least_floor(cmp, &version) && triple(&version) < upper
        }
        Op::Caret => {
            let upper = match (cmp.major, cmp.minor, cmp.patch) {
                (major, _, _) if major > 0 => (major + 1, 0, 0),
                (_, None, _) => (1, 0, 0),
                (_, Some(minor), _) if minor > 0 => (0, minor + 1, 0),
                (_, Some(_), None) => (0, 1, 0),
                (_, Some(_), Some(patch)) => (0, 0, patch + 1),
            };
            at_least_floor(cmp, &version) && triple(&version) < upper
        }
        // semver::Op 는 non_exhaustive
        _ => cmp.matches(&version),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caret_rejects_older_major() {
        assert!(!satisfies("^2.0.0", "1.2.0").unwrap());
        assert!(satisfies("^2.0.0", "2.3.4").unwrap());
        assert!(!satisfies("^2.0.0", "3.0.0").unwrap());
    }

    #[test]
    fn test_prerelease_inclusive() {
        assert!(satisfies("^2.0.0", "2.1.0-beta").unwrap());
        assert!(satisfies("^2.0.0", "2.0.0-rc.1").unwrap());
        assert!(!satisfies("^2.0.0", "3.0.0-beta").unwrap());
        assert!(satisfies("~1.2.0", "1.2.5-alpha").unwrap());
    }

    #[test]
    fn test_zero_major_caret() {
        assert!(satisfies("^0.2.3", "0.2.9").unwrap());
        assert!(!satisfies("^0.2.3", "0.3.0").unwrap());
        assert!(satisfies("^0.0.3", "0.0.3").unwrap());
        assert!(!satisfies("^0.0.3", "0.0.4").unwrap());
    }

    #[test]
    fn test_npm_style_ranges() {
        assert!(satisfies(">=1.0.0 <2.0.0", "1.5.0").unwrap());
        assert!(!satisfies(">=1.0.0 <2.0.0", "2.0.0").unwrap());
        assert!(satisfies(">= 1.0.0", "1.0.1").unwrap());
        assert!(satisfies("1.0.0 - 2.0.0", "2.0.0").unwrap());
        assert!(satisfies("^1.0.0 || ^3.0.0", "3.1.0").unwrap());
        assert!(!satisfies("^1.0.0 || ^3.0.0", "2.1.0").unwrap());
        assert!(satisfies("*", "0.0.1-dev").unwrap());
        assert!(satisfies("1.x", "1.4.0").unwrap());
    }

    #[test]
    fn test_exact_and_prefix() {
        assert!(satisfies("=1.2.0", "v1.2.0").unwrap());
        assert!(!satisfies("1.2.0", "1.2.1").unwrap());
    }

    #[test]
    fn test_invalid_input() {
        assert!(matches!(
            satisfies("not a range", "1.0.0"),
            Err(Error::Configuration(_))
        ));
        assert!(matches!(
            satisfies("^1.0.0", "one"),
            Err(Error::Configuration(_))
        ));
    }
}
