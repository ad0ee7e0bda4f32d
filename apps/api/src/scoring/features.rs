//! Feature Builder — turns an application into the ordered feature row the
//! classifier was trained on.
//!
//! Two stages:
//! 1. `TextBlocks::from_application` — pure text work (years, major, experience
//!    narrative, certifications, distilled job text).
//! 2. `embed_blocks` + `assemble` — four embedding calls, cosine similarities,
//!    fused score, raw embedding columns.

use tracing::debug;

use crate::embeddings::Embedder;
use crate::models::application::ApplicationData;
use crate::scoring::calibration::fuse;
use crate::scoring::distill::distill;
use crate::scoring::duration::{extract_job_years, parse_years};
use crate::scoring::ScoringError;

/// Experience text used when the candidate gives neither a position nor achievements.
pub const NO_EXPERIENCE_SENTINEL: &str = "Sin experiencia laboral relevante";

// Column prefixes, in classifier column order.
const JOB_PREFIX: &str = "job__emb";
const CERT_PREFIX: &str = "cert__emb";
const MAJOR_PREFIX: &str = "major__emb";
const XP_PREFIX: &str = "xp__emb";

const SCALAR_COLUMNS: [&str; 6] = [
    "XpYears",
    "JobYears",
    "sim_cert_job",
    "sim_major_job",
    "sim_xp_job",
    "score_combinado",
];

/// The four text blocks plus the years derived alongside them.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlocks {
    pub years: f64,
    pub job_years: f64,
    pub major: String,
    pub experience: String,
    pub certifications: String,
    pub job_text: String,
}

impl TextBlocks {
    pub fn from_application(app: &ApplicationData) -> Self {
        let parsed_years = parse_years(Some(app.experience.total_years.as_str()));
        let years = parsed_years.unwrap_or(0.0);

        let major = format!(
            "{} {}",
            app.education.field.as_deref().unwrap_or(""),
            app.education.highest_level
        )
        .trim()
        .to_string();

        let projects_text: String = app
            .projects
            .iter()
            .map(|p| format!("{} {} {} ", p.name, p.description, p.technologies.join(" ")))
            .collect();
        let certifications = format!("{projects_text}ademas {}", app.skills.join(" "));

        let achievements_text = app
            .experience
            .achievements
            .as_ref()
            .map(|a| a.join(" "))
            .unwrap_or_default();
        let current_position = app.experience.current_position.as_deref().unwrap_or("");

        let mut experience = current_position.to_string();
        if !achievements_text.is_empty() {
            experience.push_str(" logrando ");
            experience.push_str(&achievements_text);
        }
        let experience = if experience.trim().is_empty() {
            NO_EXPERIENCE_SENTINEL.to_string()
        } else {
            format!(
                "{} años de experiencia trabajando de {experience}",
                format_years(parsed_years)
            )
        };

        let job_text = distill(&format!(
            "{} {}",
            app.job.requirements, app.job.responsibilities
        ));
        let job_years = extract_job_years(Some(job_text.as_str()));

        TextBlocks {
            years,
            job_years,
            major,
            experience,
            certifications,
            job_text,
        }
    }
}

/// Matches the training texts: parsed whole years print with one decimal ("3.0"),
/// a value with no number at all prints a bare "0".
fn format_years(years: Option<f64>) -> String {
    match years {
        None => "0".to_string(),
        Some(y) if y.fract() == 0.0 => format!("{y:.1}"),
        Some(y) => y.to_string(),
    }
}

/// One embedding vector per text block.
#[derive(Debug, Clone, Default)]
pub struct BlockEmbeddings {
    pub major: Vec<f32>,
    pub experience: Vec<f32>,
    pub certifications: Vec<f32>,
    pub job: Vec<f32>,
}

/// Embeds each block with its own call. No caching or batching.
pub async fn embed_blocks(
    embedder: &dyn Embedder,
    blocks: &TextBlocks,
) -> Result<BlockEmbeddings, ScoringError> {
    Ok(BlockEmbeddings {
        major: embed_block(embedder, "major", &blocks.major).await?,
        experience: embed_block(embedder, "experience", &blocks.experience).await?,
        certifications: embed_block(embedder, "certifications", &blocks.certifications).await?,
        job: embed_block(embedder, "job", &blocks.job_text).await?,
    })
}

async fn embed_block(
    embedder: &dyn Embedder,
    block: &'static str,
    text: &str,
) -> Result<Vec<f32>, ScoringError> {
    embedder
        .encode(text)
        .await
        .map_err(|source| ScoringError::Embedding { block, source })
}

/// Cosine similarity computed in f64. A zero vector has similarity 0 with anything.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f64, ScoringError> {
    if a.len() != b.len() {
        return Err(ScoringError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let dot: f64 = a.iter().zip(b).map(|(x, y)| *x as f64 * *y as f64).sum();
    let norm_a = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|y| (*y as f64).powi(2)).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        Ok(0.0)
    } else {
        Ok(dot / (norm_a * norm_b))
    }
}

/// A single classifier input row.
///
/// Column order is an external contract with the trained classifier:
/// the six scalar columns, then job, certification, major and experience
/// embedding dimensions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureRow {
    pub xp_years: f64,
    pub job_years: f64,
    pub sim_cert_job: f64,
    pub sim_major_job: f64,
    pub sim_xp_job: f64,
    pub score_combinado: f64,
    pub job_emb: Vec<f32>,
    pub cert_emb: Vec<f32>,
    pub major_emb: Vec<f32>,
    pub xp_emb: Vec<f32>,
}

impl FeatureRow {
    /// Computes similarities and the fused score, then lays out the embedding columns.
    pub fn assemble(
        blocks: &TextBlocks,
        embeddings: BlockEmbeddings,
    ) -> Result<Self, ScoringError> {
        let sim_cert_job = cosine_similarity(&embeddings.certifications, &embeddings.job)?;
        let sim_major_job = cosine_similarity(&embeddings.major, &embeddings.job)?;
        let sim_xp_job = cosine_similarity(&embeddings.experience, &embeddings.job)?;

        debug!(
            "Similarities: xp={sim_xp_job:.4} major={sim_major_job:.4} cert={sim_cert_job:.4}"
        );

        let mut row = FeatureRow {
            xp_years: blocks.years,
            job_years: blocks.job_years,
            sim_cert_job,
            sim_major_job,
            sim_xp_job,
            score_combinado: 0.0,
            job_emb: embeddings.job,
            cert_emb: embeddings.certifications,
            major_emb: embeddings.major,
            xp_emb: embeddings.experience,
        };
        row.score_combinado = fuse(&row);

        Ok(row)
    }

    /// Ordered column names, e.g. `XpYears, ..., job__emb_0, ..., xp__emb_{n-1}`.
    pub fn column_names(&self) -> Vec<String> {
        let mut names: Vec<String> = SCALAR_COLUMNS.iter().map(|c| c.to_string()).collect();
        for (prefix, emb) in self.embedding_blocks() {
            names.extend((0..emb.len()).map(|i| format!("{prefix}_{i}")));
        }
        names
    }

    /// Ordered values matching `column_names`.
    pub fn values(&self) -> Vec<f64> {
        let mut values = vec![
            self.xp_years,
            self.job_years,
            self.sim_cert_job,
            self.sim_major_job,
            self.sim_xp_job,
            self.score_combinado,
        ];
        for (_, emb) in self.embedding_blocks() {
            values.extend(emb.iter().map(|v| *v as f64));
        }
        values
    }

    fn embedding_blocks(&self) -> [(&'static str, &[f32]); 4] {
        [
            (JOB_PREFIX, self.job_emb.as_slice()),
            (CERT_PREFIX, self.cert_emb.as_slice()),
            (MAJOR_PREFIX, self.major_emb.as_slice()),
            (XP_PREFIX, self.xp_emb.as_slice()),
        ]
    }
}
