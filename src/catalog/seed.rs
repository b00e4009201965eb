use crate::catalog::CatalogSource;
use crate::error::CatalogError;
use crate::model::Entry;

/// Servers compiled into the binary, used when no catalog file is configured.
pub struct SeedSource;

impl CatalogSource for SeedSource {
    fn name(&self) -> &str {
        "seed"
    }

    fn load(&self) -> Result<Vec<Entry>, CatalogError> {
        Ok(seed_entries())
    }
}

const SEED: &[(&str, &str, &str)] = &[
    ("Example Server", "This is an example MCP server", "mcp start example"),
    ("Development Server", "Local development environment with hot reload", "mcp start dev --hot-reload"),
    ("Production Server", "High-performance production server with load balancing", "mcp start prod --workers 4"),
    ("Testing Server", "Automated testing environment with coverage reports", "mcp start test --coverage"),
    ("Staging Server", "Pre-production environment for testing", "mcp start staging --debug"),
    ("Monitoring Server", "Server monitoring and metrics collection", "mcp start monitor --metrics"),
    ("Debug Server", "Development server with enhanced debugging capabilities", "mcp start debug --verbose --inspect"),
    ("Performance Server", "Optimized server for high-throughput applications", "mcp start perf --optimize --cache"),
    ("Backup Server", "Automated backup and recovery system", "mcp start backup --interval 6h"),
    ("API Server", "RESTful API server with OpenAPI documentation", "mcp start api --docs --port 8000"),
    ("Cluster Node", "Distributed computing node for scalable workloads", "mcp start node --cluster main --role worker"),
    ("Analytics Server", "Real-time data analytics and processing server", "mcp start analytics --stream --batch-size 1000"),
];

pub fn seed_entries() -> Vec<Entry> {
    SEED.iter()
        .map(|&(name, description, command)| Entry::new(name, description, command))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_has_twelve_named_servers() {
        let entries = SeedSource.load().unwrap();
        assert_eq!(entries.len(), 12);
        assert!(entries.iter().all(|e| !e.name.is_empty()));
        assert_eq!(entries[0].name, "Example Server");
        assert_eq!(entries[11].command, "mcp start analytics --stream --batch-size 1000");
    }
}
