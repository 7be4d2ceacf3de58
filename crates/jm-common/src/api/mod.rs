pub mod match_request;
pub mod match_response;

pub use match_request::{FindCandidatesQuery, FindJobsQuery, MatchScoreRequest, QueryError};
pub use match_response::{
    round2, CandidateMatchDto, CandidateSummary, ComponentScoresDto, JobMatchDto, JobSummary,
    MatchResponse, RefitResponse,
};
