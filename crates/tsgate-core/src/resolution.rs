//! Module specifier resolution shared by program loading and the resolver.
//!
//! Paths are handled as forward-slash strings so that in-memory programs and
//! on-disk programs resolve identically.

const SOURCE_EXTENSIONS: &[&str] = &[".ts", ".tsx", ".d.ts", ".mts", ".d.mts"];
const INDEX_FILES: &[&str] = &["/index.ts", "/index.tsx", "/index.d.ts"];

/// Normalizes a path lexically: converts separators, folds `.` and `..`.
pub fn normalize_path(path: &str) -> String {
    let unified = path.replace('\\', "/");
    let absolute = unified.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();

    for segment in unified.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if matches!(parts.last(), Some(last) if *last != "..") {
                    parts.pop();
                } else if !absolute {
                    parts.push("..");
                }
            }
            other => parts.push(other),
        }
    }

    let joined = parts.join("/");
    if absolute {
        format!("/{joined}")
    } else {
        joined
    }
}

/// Directory portion of a normalized path, or `""` for a bare file name.
pub fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) => "/",
        Some(index) => &path[..index],
        None => "",
    }
}

pub fn join_path(dir: &str, relative: &str) -> String {
    if relative.starts_with('/') || dir.is_empty() {
        return normalize_path(relative);
    }
    normalize_path(&format!("{dir}/{relative}"))
}

/// Removes a TypeScript source or declaration extension.
pub fn strip_ts_extension(path: &str) -> &str {
    for ext in [".d.ts", ".d.mts", ".d.cts", ".tsx", ".ts", ".mts", ".cts", ".jsx", ".js"] {
        if let Some(stripped) = path.strip_suffix(ext) {
            return stripped;
        }
    }
    path
}

pub fn is_relative_specifier(specifier: &str) -> bool {
    specifier.starts_with("./") || specifier.starts_with("../") || specifier == "." || specifier == ".."
}

/// Candidate file paths for `specifier` imported from `importer`, in lookup order.
pub fn candidate_paths(importer: &str, specifier: &str) -> Vec<String> {
    let mut candidates = Vec::new();

    if is_relative_specifier(specifier) || specifier.starts_with('/') {
        let base = join_path(parent_dir(importer), specifier);
        push_with_extensions(&mut candidates, &base);
        return candidates;
    }

    let mut dir = parent_dir(importer).to_string();
    loop {
        for prefix in ["node_modules/", "node_modules/@types/"] {
            let base = join_path(&dir, &format!("{prefix}{specifier}"));
            push_with_extensions(&mut candidates, &base);
        }
        if dir.is_empty() || dir == "/" {
            break;
        }
        dir = parent_dir(&dir).to_string();
    }

    candidates
}

fn push_with_extensions(candidates: &mut Vec<String>, base: &str) {
    let stem = base
        .strip_suffix(".js")
        .or_else(|| base.strip_suffix(".mjs"))
        .unwrap_or(base);

    if stem == base && SOURCE_EXTENSIONS.iter().any(|ext| base.ends_with(ext)) {
        candidates.push(base.to_string());
    }
    for ext in SOURCE_EXTENSIONS {
        candidates.push(format!("{stem}{ext}"));
    }
    for index in INDEX_FILES {
        candidates.push(format!("{stem}{index}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_dot_segments() {
        assert_eq!(normalize_path("src/./a/../b.ts"), "src/b.ts");
        assert_eq!(normalize_path("/proj//src/x.ts"), "/proj/src/x.ts");
        assert_eq!(normalize_path("../shared/x.ts"), "../shared/x.ts");
        assert_eq!(normalize_path("C:\\proj\\a.ts"), "C:/proj/a.ts");
    }

    #[test]
    fn parent_dir_of_bare_name_is_empty() {
        assert_eq!(parent_dir("a.ts"), "");
        assert_eq!(parent_dir("src/a.ts"), "src");
        assert_eq!(parent_dir("/a.ts"), "/");
    }

    #[test]
    fn strips_declaration_extension_first() {
        assert_eq!(strip_ts_extension("lib/legacy.d.ts"), "lib/legacy");
        assert_eq!(strip_ts_extension("src/app.tsx"), "src/app");
        assert_eq!(strip_ts_extension("README"), "README");
    }

    #[test]
    fn relative_specifier_candidates_include_index_and_extensions() {
        let candidates = candidate_paths("src/app/main.ts", "../util");

        assert_eq!(candidates[0], "src/util.ts");
        assert!(candidates.contains(&"src/util.d.ts".to_string()));
        assert!(candidates.contains(&"src/util/index.ts".to_string()));
    }

    #[test]
    fn js_extension_maps_to_typescript_sources() {
        let candidates = candidate_paths("src/main.ts", "./dep.js");

        assert_eq!(candidates[0], "src/dep.ts");
    }

    #[test]
    fn bare_specifier_walks_up_node_modules() {
        let candidates = candidate_paths("/proj/src/main.ts", "safevalues/restricted/legacy");

        assert!(candidates.contains(&"/proj/src/node_modules/safevalues/restricted/legacy.d.ts".to_string()));
        assert!(candidates.contains(&"/proj/node_modules/safevalues/restricted/legacy.d.ts".to_string()));
        assert!(candidates.contains(&"/node_modules/safevalues/restricted/legacy.d.ts".to_string()));
    }

    #[test]
    fn bare_specifier_from_relative_root() {
        let candidates = candidate_paths("src/main.ts", "safevalues");

        assert!(candidates.contains(&"node_modules/safevalues/index.d.ts".to_string()));
        assert!(candidates.contains(&"node_modules/@types/safevalues/index.d.ts".to_string()));
    }
}
