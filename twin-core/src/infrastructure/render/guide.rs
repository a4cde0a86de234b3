// twin-core/src/infrastructure/render/guide.rs

// Markdown guides at the root of the twin directory. The context never carries
// the API token, only the host.

use crate::application::ports::TemplateEngine;
use crate::error::TwinError;
use crate::infrastructure::error::InfrastructureError;
use minijinja::Environment;

pub const ROOT_README: &str = "README.md";
pub const AI_GUIDE: &str = "ai/README.md";

const ROOT_README_TEMPLATE: &str = r#"# {{ project.name }} (Twin Format)

Directory-of-JSON view of the project. **Start with:** `manifest-extended.json`

## Statistics
- Tables: {{ stats.total_tables }}
- Transformations: {{ stats.total_transformations }}
- Buckets: {{ stats.total_buckets }}
- Sources: {{ stats.total_sources }}
- Jobs: {{ stats.total_jobs }}
- Samples: {{ stats.total_samples }}

## Quick Links
- Project overview: `manifest-extended.json`
- AI guide: `ai/README.md`
- Buckets: `buckets/index.json`
- Transformations: `transformations/index.json`
- Job history: `jobs/index.json`
- Data samples: `storage/samples/index.json`
- Lineage: `indices/graph.jsonl`
"#;

const AI_GUIDE_TEMPLATE: &str = r#"# Project Guide for Automated Readers

## Project Overview

- **Project ID:** {{ project.id }}
- **Project Name:** {{ project.name }}
- **Region:** {{ project.region }}
- **Total Tables:** {{ stats.total_tables }}
- **Total Transformations:** {{ stats.total_transformations }}
- **Data Sources:** {{ stats.total_sources }}

## Project Structure

### Core Files (Start Here)
1. **manifest-extended.json** - Complete project overview
2. **buckets/index.json** - All {{ stats.total_buckets }} storage buckets
3. **transformations/index.json** - All {{ stats.total_transformations }} transformations
4. **indices/graph.jsonl** - Complete data lineage

### Platform Breakdown
{% for platform in platforms %}- **{{ platform.name }}:** {{ platform.count }} transformations
{% else %}- No transformations found
{% endfor %}
## How to Analyze This Project

### 1. Quick Project Overview
```bash
jq '.statistics' manifest-extended.json
```

### 2. Find Tables by Source
```bash
jq 'keys' indices/queries/tables-by-source.json
```

### 3. Trace Data Lineage
```bash
head -1 indices/graph.jsonl  # _meta stats
grep "table:bucket/name" indices/graph.jsonl
```

### 4. Check Transformation Platforms
```bash
jq '.by_platform' transformations/index.json
```

## Storage API Quick Reference

**Base URL:** `{{ api.base_url }}`

**Authentication:** `X-StorageApi-Token` header (token not stored here)

### Common Endpoints
- List tables: `GET /v2/storage/buckets/{bucket_id}/tables`
- Table preview: `GET /v2/storage/tables/{table_id}/data-preview?limit={{ api.sample_rows }}`
- Recent jobs: `GET /v2/storage/jobs?limit={{ api.jobs_limit }}`

## Best Practices

1. Start with `manifest-extended.json` for the overview
2. Use the pre-computed queries in `indices/queries/`
3. Check the `platform` field before reading SQL (dialects differ)
4. Samples are snapshots: check `generated_at` in `manifest-extended.json`
5. Failed jobs in `jobs/` usually point at broken inputs
"#;

pub struct GuideRenderer {
    env: Environment<'static>,
}

impl GuideRenderer {
    pub fn new() -> Result<Self, InfrastructureError> {
        let mut env = Environment::new();
        env.add_template(ROOT_README, ROOT_README_TEMPLATE)?;
        env.add_template(AI_GUIDE, AI_GUIDE_TEMPLATE)?;
        Ok(Self { env })
    }
}

impl TemplateEngine for GuideRenderer {
    fn render(&self, name: &str, context: &serde_json::Value) -> Result<String, TwinError> {
        let render = || -> Result<String, minijinja::Error> {
            self.env.get_template(name)?.render(context)
        };
        render().map_err(|e| TwinError::Infrastructure(InfrastructureError::TemplateError(e)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use anyhow::Result;
    use serde_json::json;

    fn context() -> serde_json::Value {
        json!({
            "project": {"id": "1234", "name": "Acme Analytics", "region": "eu-central-1"},
            "stats": {
                "total_tables": 2, "total_transformations": 1, "total_buckets": 1,
                "total_sources": 1, "total_jobs": 0, "total_samples": 0
            },
            "platforms": [{"name": "snowflake", "count": 1}],
            "api": {"base_url": "https://connection.keboola.com", "jobs_limit": 100, "sample_rows": 100}
        })
    }

    #[test]
    fn test_ai_guide_lists_platforms() -> Result<()> {
        let renderer = GuideRenderer::new()?;
        let out = renderer.render(AI_GUIDE, &context())?;
        assert!(out.contains("- **snowflake:** 1 transformations"));
        assert!(out.contains("**Project Name:** Acme Analytics"));
        assert!(out.contains("`https://connection.keboola.com`"));
        Ok(())
    }

    #[test]
    fn test_root_readme_stats() -> Result<()> {
        let renderer = GuideRenderer::new()?;
        let out = renderer.render(ROOT_README, &context())?;
        assert!(out.starts_with("# Acme Analytics (Twin Format)"));
        assert!(out.contains("- Tables: 2"));
        Ok(())
    }

    #[test]
    fn test_unknown_template_is_an_error() -> Result<()> {
        let renderer = GuideRenderer::new()?;
        assert!(renderer.render("missing.md", &context()).is_err());
        Ok(())
    }
}
