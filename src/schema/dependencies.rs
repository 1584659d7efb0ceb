use super::tables::{get_table, ALL_TABLES};
use super::types::TableSchema;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Orders tables so that FK parents are created before their children
pub struct DependencyResolver {
    /// Map of table name -> tables it depends on
    deps: HashMap<&'static str, HashSet<&'static str>>,
    /// Map of table name -> tables that depend on it
    reverse_deps: HashMap<&'static str, HashSet<&'static str>>,
}

impl DependencyResolver {
    pub fn new() -> Self {
        Self::for_tables(ALL_TABLES)
    }

    pub fn for_tables(tables: &[&'static TableSchema]) -> Self {
        let mut deps: HashMap<&'static str, HashSet<&'static str>> = HashMap::new();
        let mut reverse_deps: HashMap<&'static str, HashSet<&'static str>> = HashMap::new();

        for table in tables {
            let table_deps = table.dependencies();
            deps.insert(table.name, table_deps.clone());

            for dep in table_deps {
                if dep != table.name {
                    reverse_deps.entry(dep).or_default().insert(table.name);
                }
            }
        }

        Self { deps, reverse_deps }
    }

    /// Tables that hold a foreign key into `name`, sorted
    pub fn dependents_of(&self, name: &str) -> Vec<&'static str> {
        self.reverse_deps
            .get(name)
            .map(|set| set.iter().copied().collect::<BTreeSet<_>>().into_iter().collect())
            .unwrap_or_default()
    }

    /// Every known table in creation order (parents before children)
    pub fn creation_order(&self) -> Result<Vec<&'static TableSchema>, String> {
        // Sorted iteration keeps the output stable between runs
        let names: BTreeSet<&str> = self.deps.keys().copied().collect();
        let mut result = Vec::new();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut temp_visited: HashSet<&str> = HashSet::new();

        for name in &names {
            self.visit(name, &mut visited, &mut temp_visited, &mut result)?;
        }

        Ok(result)
    }

    fn visit<'a>(
        &'a self,
        name: &'a str,
        visited: &mut HashSet<&'a str>,
        temp_visited: &mut HashSet<&'a str>,
        result: &mut Vec<&'static TableSchema>,
    ) -> Result<(), String> {
        if visited.contains(name) {
            return Ok(());
        }
        if temp_visited.contains(name) {
            return Err(format!("Circular dependency detected at: {}", name));
        }

        temp_visited.insert(name);

        if let Some(deps) = self.deps.get(name) {
            let mut ordered: Vec<&str> = deps.iter().copied().collect();
            ordered.sort_unstable();
            for dep in ordered {
                // chemical_activity.parent_chemical_activity_id points at itself
                if dep != name {
                    if !self.deps.contains_key(dep) {
                        return Err(format!("{} references unknown table {}", name, dep));
                    }
                    self.visit(dep, visited, temp_visited, result)?;
                }
            }
        }

        temp_visited.remove(name);
        visited.insert(name);

        if let Some(table) = get_table(name) {
            result.push(table);
        }

        Ok(())
    }
}

impl Default for DependencyResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(names: &[&str], name: &str) -> usize {
        names.iter().position(|&n| n == name).unwrap()
    }

    #[test]
    fn test_creation_order_puts_parents_first() {
        let resolver = DependencyResolver::new();
        let tables = resolver.creation_order().unwrap();
        let names: Vec<_> = tables.iter().map(|t| t.name).collect();

        assert_eq!(names.len(), ALL_TABLES.len());
        assert!(position(&names, "additive") < position(&names, "record"));
        assert!(position(&names, "industry_sector") < position(&names, "record"));
        assert!(position(&names, "release_type") < position(&names, "record"));
        assert!(position(&names, "record") < position(&names, "record_chemical_activity"));
        assert!(
            position(&names, "chemical_activity") < position(&names, "record_chemical_activity")
        );
    }

    #[test]
    fn test_self_reference_is_not_a_cycle() {
        let resolver = DependencyResolver::new();
        assert!(resolver.creation_order().is_ok());
        assert!(!resolver
            .dependents_of("chemical_activity")
            .contains(&"chemical_activity"));
    }

    #[test]
    fn test_dependents_of_industry_sector() {
        let resolver = DependencyResolver::new();
        let dependents = resolver.dependents_of("industry_sector");
        assert!(dependents.contains(&"record"));
        assert!(dependents.contains(&"industry_use_sector_naics"));
        assert!(resolver.dependents_of("record_chemical_activity").is_empty());
    }
}
