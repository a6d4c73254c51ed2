//! Integration tests for the Resolver state machine against a scripted source.

use std::sync::Arc;

use hrdesk_resolver::{
    AutoSelect, FailedAt, Request, Resolver, ResolverError, ResolverState, ScriptedSource,
    Selection, Stage,
};

type TestResolver = Resolver<ScriptedSource<String>>;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// group → proposal → dimension → drilldown
fn stages() -> Vec<Stage> {
    vec![
        Stage::new("group", "개요"),
        Stage::new("proposal", "개요"),
        Stage::new("dimension", "개요").with_auto_select(AutoSelect::First),
        Stage::new("drilldown", "전체").with_auto_select(AutoSelect::Preferred("전체".into())),
    ]
}

fn source() -> ScriptedSource<String> {
    ScriptedSource::new()
        .with_options(0, &[], &["인사", "재무"])
        .with_options(1, &["인사"], &["P1", "P2", "P3"])
        .with_options(2, &["인사", "P1"], &["전체", "부서"])
        .with_options(2, &["인사", "P2"], &["전체"])
        .with_options(2, &["인사", "P3"], &[])
        .with_options(3, &["인사", "P1", "전체"], &["전체"])
        .with_options(3, &["인사", "P1", "부서"], &["전체", "영업본부", "개발본부"])
        .with_options(3, &["인사", "P2", "전체"], &["전체"])
        .with_result(&["인사", "P1", "전체", "전체"], "view P1/전체/전체".into())
        .with_result(&["인사", "P1", "부서", "전체"], "view P1/부서/전체".into())
        .with_result(&["인사", "P1", "부서", "영업본부"], "view P1/부서/영업본부".into())
        .with_result(&["인사", "P2", "전체", "전체"], "view P2/전체/전체".into())
}

/// A resolver with stage-0 options loaded and group "인사" selected.
async fn at_group(source: &Arc<ScriptedSource<String>>) -> TestResolver {
    let mut resolver = Resolver::new(stages(), Arc::clone(source)).unwrap();
    resolver.start();
    resolver.settle().await;
    resolver.select(0, "인사".into()).unwrap();
    resolver.settle().await;
    resolver
}

/// Scenario A end state: P1 selected, defaults cascaded, result ready.
async fn ready_on_p1(source: &Arc<ScriptedSource<String>>) -> TestResolver {
    let mut resolver = at_group(source).await;
    resolver.select(1, "P1".into()).unwrap();
    resolver.settle().await;
    assert_eq!(resolver.state(), ResolverState::Ready);
    resolver
}

fn result_calls(source: &ScriptedSource<String>) -> usize {
    source
        .calls()
        .iter()
        .filter(|c| matches!(c, Request::Result { .. }))
        .count()
}

// ---------------------------------------------------------------------------
// Construction and start
// ---------------------------------------------------------------------------

#[test]
fn single_stage_chain_is_rejected() {
    let source = Arc::new(ScriptedSource::<String>::new());
    let result = Resolver::new(vec![Stage::new("only", "전체")], source);
    assert!(matches!(result, Err(ResolverError::TooFewStages(1))));
}

#[tokio::test]
async fn starts_idle_then_loads_first_stage() {
    let source = Arc::new(source());
    let mut resolver = Resolver::new(stages(), Arc::clone(&source)).unwrap();
    assert_eq!(resolver.state(), ResolverState::Idle);
    assert!(resolver.selections().values().iter().all(|s| !s.is_selected()));

    resolver.start();
    assert_eq!(resolver.state(), ResolverState::FetchingOptions(0));

    assert_eq!(resolver.settle().await, 1);
    assert_eq!(resolver.state(), ResolverState::Idle);
    assert_eq!(resolver.options(0).to_vec(), strings(&["인사", "재무"]));
    assert_eq!(resolver.selection(0), Some(&Selection::Unselected));
    assert!(resolver.options(1).is_empty());
}

// ---------------------------------------------------------------------------
// Scenario A: defaults cascade to the terminal fetch
// ---------------------------------------------------------------------------

#[tokio::test]
async fn selecting_a_proposal_cascades_defaults_to_result() {
    let source = Arc::new(source());
    let mut resolver = at_group(&source).await;

    assert_eq!(resolver.state(), ResolverState::Idle);
    assert_eq!(resolver.options(1).to_vec(), strings(&["P1", "P2", "P3"]));
    assert_eq!(resolver.selection(1), Some(&Selection::Unselected));

    assert!(resolver.select(1, "P1".into()).unwrap());
    assert_eq!(resolver.state(), ResolverState::FetchingOptions(2));

    // dimension options, drilldown options, result
    assert_eq!(resolver.settle().await, 3);

    assert_eq!(resolver.state(), ResolverState::Ready);
    assert_eq!(
        resolver.selections().values().to_vec(),
        vec![
            Selection::from("인사"),
            Selection::from("P1"),
            Selection::from("전체"),
            Selection::from("전체"),
        ]
    );
    assert!(resolver.is_terminal_resolved());
    assert_eq!(resolver.options(3).to_vec(), strings(&["전체"]));
    assert_eq!(resolver.payload().map(String::as_str), Some("view P1/전체/전체"));
    assert_eq!(
        source.call_count(&Request::result(&["인사", "P1", "전체", "전체"])),
        1
    );
}

#[tokio::test]
async fn cache_holds_fetched_lists_per_prefix() {
    let source = Arc::new(source());
    let resolver = ready_on_p1(&source).await;

    let entry = resolver
        .cache()
        .get(2, &strings(&["인사", "P1"]))
        .expect("dimension options cached");
    assert_eq!(entry.options, strings(&["전체", "부서"]));
    assert_eq!(entry.default, Selection::from("전체"));
    assert!(resolver.cache().get(2, &strings(&["인사", "P2"])).is_none());
}

// ---------------------------------------------------------------------------
// Scenario B: stale responses are inert
// ---------------------------------------------------------------------------

#[tokio::test]
async fn late_response_for_superseded_proposal_is_ignored() {
    let source = Arc::new(source());
    let mut resolver = at_group(&source).await;

    let gate = source.hold(Request::options(2, &["인사", "P1"]));
    resolver.select(1, "P1".into()).unwrap();
    resolver.select(1, "P2".into()).unwrap();

    // P2's dimension list arrives first and is applied.
    assert_eq!(resolver.pump().await, Some(true));
    assert_eq!(resolver.options(2).to_vec(), strings(&["전체"]));

    // P1's list arrives afterwards.
    gate.release();
    resolver.settle().await;

    assert_eq!(resolver.state(), ResolverState::Ready);
    assert_eq!(resolver.selection(1), Some(&Selection::from("P2")));
    assert_eq!(resolver.options(2).to_vec(), strings(&["전체"]));
    assert!(resolver.cache().get(2, &strings(&["인사", "P1"])).is_none());
    assert_eq!(resolver.payload().map(String::as_str), Some("view P2/전체/전체"));
    assert_eq!(
        source.call_count(&Request::result(&["인사", "P1", "전체", "전체"])),
        0
    );
}

#[tokio::test]
async fn older_token_applied_after_newer_is_a_no_op() {
    let source = Arc::new(source());
    let mut resolver = at_group(&source).await;

    resolver.select(1, "P1".into()).unwrap();
    resolver.select(1, "P2".into()).unwrap();

    let first = resolver.next_completion().await.unwrap();
    let second = resolver.next_completion().await.unwrap();
    let (older, newer) = if first.token() < second.token() {
        (first, second)
    } else {
        (second, first)
    };

    assert!(resolver.apply(newer));
    let after_newer = resolver.selections().clone();
    let options_after_newer = resolver.options(2).to_vec();

    assert!(!resolver.apply(older));
    assert_eq!(resolver.selections(), &after_newer);
    assert_eq!(resolver.options(2).to_vec(), options_after_newer);
    assert_eq!(resolver.state(), ResolverState::FetchingOptions(3));
}

#[tokio::test]
async fn in_flight_result_is_dropped_when_upstream_changes() {
    let source = Arc::new(source());
    let mut resolver = at_group(&source).await;

    let gate = source.hold(Request::result(&["인사", "P1", "전체", "전체"]));
    resolver.select(1, "P1".into()).unwrap();
    // dimension and drilldown options
    resolver.pump().await;
    resolver.pump().await;
    assert_eq!(resolver.state(), ResolverState::FetchingResult);

    resolver.select(2, "부서".into()).unwrap();
    gate.release();
    resolver.settle().await;

    assert_eq!(resolver.state(), ResolverState::Ready);
    assert_eq!(resolver.payload().map(String::as_str), Some("view P1/부서/전체"));
}

#[tokio::test]
async fn user_choice_survives_late_refetch_of_its_own_stage() {
    let source = Arc::new(source());
    let mut resolver = ready_on_p1(&source).await;
    resolver.select(1, "P2".into()).unwrap();
    resolver.settle().await;

    // Back to P1: the dimension list is refetched while the cached one is offered.
    let gate = source.hold(Request::options(2, &["인사", "P1"]));
    resolver.select(1, "P1".into()).unwrap();
    assert_eq!(resolver.state(), ResolverState::FetchingOptions(2));
    assert_eq!(resolver.options(2).to_vec(), strings(&["전체", "부서"]));

    assert!(resolver.select(2, "부서".into()).unwrap());
    gate.release();

    // drilldown options and result; the held dimension list is discarded
    assert_eq!(resolver.settle().await, 2);

    assert_eq!(resolver.state(), ResolverState::Ready);
    assert_eq!(
        resolver.selections().values().to_vec(),
        vec![
            Selection::from("인사"),
            Selection::from("P1"),
            Selection::from("부서"),
            Selection::from("전체"),
        ]
    );
    assert_eq!(resolver.payload().map(String::as_str), Some("view P1/부서/전체"));
    assert_eq!(
        source.call_count(&Request::result(&["인사", "P1", "전체", "전체"])),
        1
    );
}

// ---------------------------------------------------------------------------
// Scenario C: result failure is recoverable
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failed_result_clears_payload_and_recovers_on_new_selection() {
    let source = Arc::new(source());
    source.fail_result(&["인사", "P1", "전체", "전체"], "500 Internal Server Error");
    let mut resolver = at_group(&source).await;

    resolver.select(1, "P1".into()).unwrap();
    resolver.settle().await;

    assert_eq!(resolver.state(), ResolverState::Failed(FailedAt::Result));
    assert!(resolver.payload().is_none());
    assert_eq!(
        resolver.last_error(),
        Some(&ResolverError::ResultFetchFailed {
            selections: strings(&["인사", "P1", "전체", "전체"]),
            message: "500 Internal Server Error".into(),
        })
    );

    resolver.select(2, "부서".into()).unwrap();
    assert!(resolver.last_error().is_none());
    assert_eq!(resolver.state(), ResolverState::FetchingOptions(3));

    resolver.pump().await;
    assert_eq!(resolver.state(), ResolverState::FetchingResult);

    resolver.settle().await;
    assert_eq!(resolver.state(), ResolverState::Ready);
    assert_eq!(resolver.payload().map(String::as_str), Some("view P1/부서/전체"));
}

#[tokio::test]
async fn failed_result_is_not_retried_automatically() {
    let source = Arc::new(source());
    source.fail_result(&["인사", "P1", "전체", "전체"], "boom");
    let mut resolver = at_group(&source).await;
    resolver.select(1, "P1".into()).unwrap();
    resolver.settle().await;

    assert_eq!(resolver.in_flight(), 0);
    assert_eq!(result_calls(&source), 1);

    source.set_result(&["인사", "P1", "전체", "전체"], "second try".into());
    assert!(resolver.retry());
    resolver.settle().await;

    assert_eq!(result_calls(&source), 2);
    assert_eq!(resolver.payload().map(String::as_str), Some("second try"));
}

// ---------------------------------------------------------------------------
// Scenario D: empty option list stops the chain
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_dimension_list_leaves_downstream_unselected() {
    let source = Arc::new(source());
    let mut resolver = at_group(&source).await;

    resolver.select(1, "P3".into()).unwrap();
    resolver.settle().await;

    assert_eq!(resolver.state(), ResolverState::Idle);
    assert_eq!(resolver.selection(2), Some(&Selection::Unselected));
    assert_eq!(resolver.selection(3), Some(&Selection::Unselected));
    assert!(resolver.options(2).is_empty());
    assert!(resolver.payload().is_none());
    assert_eq!(result_calls(&source), 0);
    assert_eq!(
        source.call_count(&Request::options(3, &["인사", "P3", "전체"])),
        0
    );
}

// ---------------------------------------------------------------------------
// Option fetch failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failed_options_fetch_empties_stage_until_retried() {
    let source = Arc::new(source());
    source.fail_options(1, &["재무"], "502 Bad Gateway");
    let mut resolver = ready_on_p1(&source).await;

    resolver.select(0, "재무".into()).unwrap();
    resolver.settle().await;

    assert_eq!(resolver.state(), ResolverState::Failed(FailedAt::Stage(1)));
    assert!(resolver.options(1).is_empty());
    assert!(resolver.payload().is_none());
    assert_eq!(
        resolver.last_error(),
        Some(&ResolverError::OptionsFetchFailed {
            stage: 1,
            prefix: strings(&["재무"]),
            message: "502 Bad Gateway".into(),
        })
    );
    assert!(matches!(
        resolver.select(1, "F1".into()),
        Err(ResolverError::InvalidSelection { stage: 1, .. })
    ));

    source.set_options(1, &["재무"], &["F1"]);
    assert!(resolver.retry());
    resolver.settle().await;

    assert_eq!(resolver.state(), ResolverState::Idle);
    assert!(resolver.last_error().is_none());
    assert_eq!(resolver.options(1).to_vec(), strings(&["F1"]));
}

#[tokio::test]
async fn retry_outside_failure_does_nothing() {
    let source = Arc::new(source());
    let mut resolver = ready_on_p1(&source).await;
    assert!(!resolver.retry());
    assert_eq!(resolver.in_flight(), 0);
}

// ---------------------------------------------------------------------------
// Selection rules
// ---------------------------------------------------------------------------

#[tokio::test]
async fn reselecting_current_value_is_a_no_op() {
    let source = Arc::new(source());
    let mut resolver = ready_on_p1(&source).await;
    let calls_before = source.calls().len();

    assert!(!resolver.select(3, "전체".into()).unwrap());
    assert!(!resolver.select(1, "P1".into()).unwrap());

    assert_eq!(resolver.in_flight(), 0);
    assert_eq!(source.calls().len(), calls_before);
    assert_eq!(resolver.state(), ResolverState::Ready);
    assert_eq!(resolver.payload().map(String::as_str), Some("view P1/전체/전체"));
}

#[tokio::test]
async fn changing_a_stage_resets_everything_after_it() {
    let source = Arc::new(source());
    let mut resolver = ready_on_p1(&source).await;

    resolver.select(0, "재무".into()).unwrap();

    assert_eq!(
        resolver.selections().values().to_vec(),
        vec![
            Selection::from("재무"),
            Selection::Unselected,
            Selection::Unselected,
            Selection::Unselected,
        ]
    );
    assert!(resolver.payload().is_none());
    assert_eq!(resolver.state(), ResolverState::FetchingOptions(1));
}

#[tokio::test]
async fn unselecting_returns_to_idle() {
    let source = Arc::new(source());
    let mut resolver = ready_on_p1(&source).await;

    assert!(resolver.select(1, Selection::Unselected).unwrap());

    assert_eq!(resolver.state(), ResolverState::Idle);
    assert_eq!(resolver.in_flight(), 0);
    assert!(resolver.payload().is_none());
    assert!(!resolver.is_terminal_resolved());
}

#[tokio::test]
async fn terminal_change_fetches_a_new_result() {
    let source = Arc::new(source());
    let mut resolver = ready_on_p1(&source).await;
    resolver.select(2, "부서".into()).unwrap();
    resolver.settle().await;

    assert_eq!(
        resolver.options(3).to_vec(),
        strings(&["전체", "영업본부", "개발본부"])
    );
    resolver.select(3, "영업본부".into()).unwrap();
    assert_eq!(resolver.state(), ResolverState::FetchingResult);
    assert!(resolver.payload().is_none());

    resolver.settle().await;
    assert_eq!(
        resolver.payload().map(String::as_str),
        Some("view P1/부서/영업본부")
    );
}

#[tokio::test]
async fn value_outside_current_options_is_rejected() {
    let source = Arc::new(source());
    let mut resolver = at_group(&source).await;
    let before = resolver.selections().clone();

    let err = resolver.select(1, "P9".into()).unwrap_err();

    assert_eq!(
        err,
        ResolverError::InvalidSelection {
            stage: 1,
            value: "P9".into()
        }
    );
    assert_eq!(resolver.selections(), &before);
    assert_eq!(resolver.in_flight(), 0);
}

#[tokio::test]
async fn selection_past_an_unselected_stage_is_rejected() {
    let source = Arc::new(source());
    let mut resolver = at_group(&source).await;

    assert!(matches!(
        resolver.select(2, "전체".into()),
        Err(ResolverError::InvalidSelection { stage: 2, .. })
    ));
    assert_eq!(
        resolver.select(4, Selection::Unselected),
        Err(ResolverError::StageOutOfRange { stage: 4, len: 4 })
    );
}

#[tokio::test]
async fn selections_never_have_gaps() {
    let source = Arc::new(source());
    let mut resolver = Resolver::new(stages(), Arc::clone(&source)).unwrap();
    resolver.start();

    let steps: Vec<(usize, Selection)> = vec![
        (0, "인사".into()),
        (1, "P1".into()),
        (2, "부서".into()),
        (3, "개발본부".into()),
        (1, "P2".into()),
        (1, "P3".into()),
        (0, Selection::Unselected),
        (0, "인사".into()),
    ];

    for (stage, selection) in steps {
        while resolver.pump().await.is_some() {
            assert!(resolver.selections().is_contiguous());
        }
        resolver.select(stage, selection).unwrap();
        assert!(resolver.selections().is_contiguous());
        for later in stage + 1..4 {
            assert_eq!(resolver.selection(later), Some(&Selection::Unselected));
        }
    }
}
