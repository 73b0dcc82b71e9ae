//! Report orchestrator
//!
//! One engine invocation: fetch a snapshot, compute every section over it,
//! narrate each section. [`Engine::run`] never fails; a broken source yields
//! a report over an empty snapshot with `source_error` set, and a broken
//! narrator yields fallback text.

use crate::aggregator::aggregate_dimension;
use crate::correlation::{self, CorrelationReport};
use crate::forecast::{self, ProjectionResult};
use crate::narrative::{narrate_or_fallback, NarrativeOutcome, NarrativeRequest, Narrator};
use crate::overview::{self, NewIndustry, Overview, Ranking};
use crate::percentile::{classify_outliers, OutlierReport};
use crate::reliability::ReliabilityGate;
use crate::source::{RecordQuery, RecordSource};
use chrono::NaiveDate;
use dealscope_common::time::format_date;
use dealscope_common::{Clock, Dimension, EngineParams, Record};
use serde::Serialize;
use std::sync::Arc;

/// Every computed section, before narration
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub overview: Overview,
    pub rankings: Vec<Ranking>,
    /// Outlier classification over industries
    pub outliers: OutlierReport,
    pub correlations: CorrelationReport,
    pub projection: ProjectionResult,
    pub new_industries: Vec<NewIndustry>,
}

impl Analysis {
    pub fn ranking(&self, dimension: Dimension) -> Option<&Ranking> {
        self.rankings.iter().find(|r| r.dimension == dimension)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Narratives {
    pub ranking: NarrativeOutcome,
    pub correlation: NarrativeOutcome,
    pub forecast: NarrativeOutcome,
    pub opportunities: NarrativeOutcome,
}

impl Narratives {
    pub fn all(&self) -> [&NarrativeOutcome; 4] {
        [&self.ranking, &self.correlation, &self.forecast, &self.opportunities]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Clock date the report was computed against, `YYYY-MM-DD`
    pub generated_for: String,
    pub query: RecordQuery,
    pub analysis: Analysis,
    pub narratives: Narratives,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_error: Option<String>,
}

/// Stateless analytics engine
///
/// Holds only configuration; concurrent calls share nothing mutable.
#[derive(Clone)]
pub struct Engine {
    params: EngineParams,
    clock: Arc<dyn Clock>,
}

impl Engine {
    pub fn new(params: EngineParams, clock: Arc<dyn Clock>) -> Self {
        Self { params, clock }
    }

    /// Compute every section over `records`
    pub fn analyze(&self, records: &[Record]) -> Analysis {
        self.analyze_at(records, self.clock.today())
    }

    /// [`Engine::analyze`] against an already-read `today`
    pub fn analyze_at(&self, records: &[Record], today: NaiveDate) -> Analysis {
        let params = &self.params;
        let gate = ReliabilityGate::new(params.min_reliability_sample);

        let industries = aggregate_dimension(records, Dimension::Industry, params.rate_precision);

        Analysis {
            overview: Overview::compute(records, params.rate_precision),
            rankings: overview::rankings(records, params),
            outliers: classify_outliers(industries, &gate, params),
            correlations: correlation::analyze(records, params),
            projection: forecast::project_at(records, today, params),
            new_industries: overview::new_industries(records, today, params.new_industry_window_days),
        }
    }

    /// Fetch, analyze and narrate
    ///
    /// The clock is read once; every section and `generated_for` share that date.
    pub async fn run(&self, source: &dyn RecordSource, narrator: &dyn Narrator, query: &RecordQuery) -> Report {
        let today = self.clock.today();

        let (records, source_error) = match source.fetch(query).await {
            Ok(records) => (records, None),
            Err(e) => {
                tracing::warn!(source = source.name(), error = %e, "Record source failed, reporting over empty snapshot");
                (Vec::new(), Some(e.to_string()))
            }
        };

        tracing::info!(
            source = source.name(),
            records = records.len(),
            today = %today,
            "Computing report"
        );

        let analysis = self.analyze_at(&records, today);

        let industry_groups = analysis
            .ranking(Dimension::Industry)
            .map(|r| r.groups())
            .unwrap_or_default();
        let ranking_request = NarrativeRequest::ranking(Dimension::Industry, &industry_groups);
        let correlation_request = NarrativeRequest::correlation(&analysis.correlations, self.params.correlation_top_n);
        let forecast_request = NarrativeRequest::forecast(&analysis.projection);
        let opportunities_request = NarrativeRequest::opportunities(Dimension::Industry, &analysis.outliers);

        let (ranking, correlation, forecast, opportunities) = tokio::join!(
            narrate_or_fallback(narrator, &ranking_request),
            narrate_or_fallback(narrator, &correlation_request),
            narrate_or_fallback(narrator, &forecast_request),
            narrate_or_fallback(narrator, &opportunities_request),
        );

        Report {
            generated_for: format_date(today),
            query: query.clone(),
            analysis,
            narratives: Narratives {
                ranking,
                correlation,
                forecast,
                opportunities,
            },
            source_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::Period;
    use crate::narrative::DisabledNarrator;
    use crate::source::InMemorySource;
    use chrono::Days;
    use dealscope_common::FixedClock;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Advances one day on every read
    struct SteppingClock {
        start: NaiveDate,
        reads: AtomicU64,
    }

    impl Clock for SteppingClock {
        fn today(&self) -> NaiveDate {
            let offset = self.reads.fetch_add(1, Ordering::SeqCst);
            self.start + Days::new(offset)
        }
    }

    fn engine(today: NaiveDate) -> Engine {
        Engine::new(EngineParams::default(), Arc::new(FixedClock::new(today)))
    }

    #[test]
    fn test_analyze_empty_snapshot() {
        let analysis = engine(NaiveDate::from_ymd_opt(2024, 5, 10).unwrap()).analyze(&[]);
        assert_eq!(analysis.overview.total_meetings, 0);
        assert_eq!(analysis.rankings.len(), Dimension::ALL.len());
        assert!(analysis.rankings.iter().all(|r| r.entries.is_empty()));
        assert!(analysis.outliers.expansion_opportunities.is_empty());
        assert!(analysis.outliers.needs_strategy.is_empty());
        assert!(analysis.correlations.sellers.is_empty());
        assert!(analysis.projection.is_insufficient());
        assert!(analysis.new_industries.is_empty());
    }

    #[test]
    fn test_single_perfect_industry_is_well_typed() {
        let day = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        let records: Vec<Record> = (1..=3)
            .map(|id| {
                Record::new(id, day)
                    .with_dimension(Dimension::Industry, "Tech")
                    .with_closed(true)
            })
            .collect();

        let analysis = engine(NaiveDate::from_ymd_opt(2024, 5, 10).unwrap()).analyze(&records);
        assert_eq!(analysis.outliers.groups_considered, 1);
        let json = serde_json::to_value(&analysis).unwrap();
        assert_eq!(json["outliers"]["expansionOpportunities"][0]["key"], "Tech");
        assert_eq!(json["outliers"]["needsStrategy"][0]["key"], "Tech");
    }

    #[tokio::test]
    async fn test_run_reads_clock_once() {
        let may_31 = NaiveDate::from_ymd_opt(2024, 5, 31).unwrap();
        let clock = Arc::new(SteppingClock {
            start: may_31,
            reads: AtomicU64::new(0),
        });
        let engine = Engine::new(EngineParams::default(), clock.clone());
        let records = vec![
            Record::new(1, NaiveDate::from_ymd_opt(2024, 5, 2).unwrap()).with_dimension(Dimension::Industry, "Tech"),
            Record::new(2, NaiveDate::from_ymd_opt(2024, 5, 20).unwrap()).with_dimension(Dimension::Industry, "Tech"),
        ];
        let source = InMemorySource::new(records);

        let report = engine.run(&source, &DisabledNarrator, &RecordQuery::all()).await;

        assert_eq!(clock.reads.load(Ordering::SeqCst), 1);
        assert_eq!(report.generated_for, "2024-05-31");
        // a second read would have moved the timeline into June
        let first = &report.analysis.projection.timeline[0];
        assert_eq!(first.date, "2024-05-01");
        assert_eq!(first.period, Period::Current);
        assert_eq!(report.analysis.projection.data_points, 2);
    }
}
