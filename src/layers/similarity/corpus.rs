// Attack-embedding corpus loader (spec §3 AttackEmbedding, §6 on-disk
// format). The spec's reference format is `embeddings.npz` + metadata.json;
// no crate in this stack reads .npz, so the matrix is realized as a JSON
// sidecar too (`embeddings.json`) — an "equivalent" artifact, see DESIGN.md.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::AttackEmbedding;

/// Row-major (N, D) float32 matrix, L2-normalized at load time so Layer 2's
/// similarity computation reduces to a single dot product per row.
pub struct AttackCorpus {
    pub rows: usize,
    pub cols: usize,
    pub matrix: Vec<f32>,
    pub metadata: Vec<AttackEmbedding>,
}

#[derive(Deserialize)]
struct EmbeddingsFile {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

#[derive(Deserialize)]
struct MetadataFile {
    patterns: Vec<MetadataEntry>,
}

#[derive(Deserialize)]
struct MetadataEntry {
    category: String,
    subcategory: Option<String>,
    label: String,
}

impl AttackCorpus {
    pub fn load(dir: &Path) -> Result<Self> {
        let embeddings_path = dir.join("embeddings.json");
        let metadata_path = dir.join("metadata.json");

        let embeddings_text = std::fs::read_to_string(&embeddings_path)
            .with_context(|| format!("failed to read {}", embeddings_path.display()))?;
        let metadata_text = std::fs::read_to_string(&metadata_path)
            .with_context(|| format!("failed to read {}", metadata_path.display()))?;

        let embeddings: EmbeddingsFile = serde_json::from_str(&embeddings_text)
            .context("failed to parse embeddings.json")?;
        let metadata: MetadataFile =
            serde_json::from_str(&metadata_text).context("failed to parse metadata.json")?;

        anyhow::ensure!(
            embeddings.data.len() == embeddings.rows * embeddings.cols,
            "embeddings.json data length {} does not match rows*cols {}",
            embeddings.data.len(),
            embeddings.rows * embeddings.cols
        );
        anyhow::ensure!(
            metadata.patterns.len() == embeddings.rows,
            "metadata.json has {} entries but embeddings.json has {} rows",
            metadata.patterns.len(),
            embeddings.rows
        );

        let metadata = metadata
            .patterns
            .into_iter()
            .enumerate()
            .map(|(index, entry)| AttackEmbedding {
                index,
                category: entry
                    .category
                    .parse()
                    .unwrap_or(crate::model::AttackCategory::InstructionOverride),
                subcategory: entry.subcategory,
                label: entry.label,
            })
            .collect();

        let matrix = normalize_rows(embeddings.data, embeddings.rows, embeddings.cols);

        Ok(Self {
            rows: embeddings.rows,
            cols: embeddings.cols,
            matrix,
            metadata,
        })
    }
}

/// L2-normalize every row in place so the similarity pass is a plain dot
/// product (spec §4.2: "the implementation is free to pre-normalize at load
/// time").
fn normalize_rows(mut matrix: Vec<f32>, rows: usize, cols: usize) -> Vec<f32> {
    for row in 0..rows {
        let start = row * cols;
        let end = start + cols;
        let norm: f32 = matrix[start..end].iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > f32::EPSILON {
            for v in &mut matrix[start..end] {
                *v /= norm;
            }
        }
    }
    matrix
}
