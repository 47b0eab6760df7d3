//! Compiled contract artifacts.
//!
//! Artifacts are read from an existing build output directory. Both the Hardhat layout
//! (`artifacts/contracts/<File>.sol/<Name>.json`) and the Foundry layout
//! (`out/<File>.sol/<Name>.json`) are supported.

use crate::DeployError;
use alloy_dyn_abi::{DynSolValue, JsonAbiExt, Specifier};
use alloy_json_abi::{ContractObject, JsonAbi};
use alloy_primitives::Bytes;
use serde_json::Value;
use std::{
    fmt, fs,
    ops::Range,
    path::{Path, PathBuf},
    str::FromStr,
};
use walkdir::WalkDir;

/// Directories of the build output that never contain contract artifacts.
const SKIPPED_DIRS: &[&str] = &["build-info", "cache"];

/// Identifies a compiled contract, either by name or fully qualified as `<path>:<name>`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ArtifactReference {
    /// The source file the contract is defined in, if qualified.
    pub path: Option<String>,
    /// The contract name.
    pub name: String,
}

impl ArtifactReference {
    /// Creates an unqualified reference.
    pub fn new(name: impl Into<String>) -> Self {
        Self { path: None, name: name.into() }
    }

    /// Returns `true` if this reference matches a contract named `name` defined in `source`.
    ///
    /// Paths are compared component-wise on their common suffix, so `LogStore.sol:LogStore`
    /// matches an artifact compiled from `contracts/LogStore.sol`.
    pub fn matches(&self, name: &str, source: Option<&str>) -> bool {
        if self.name != name {
            return false;
        }
        let Some(path) = &self.path else { return true };
        let Some(source) = source else { return false };
        let (path, source) = (Path::new(path), Path::new(source));
        source.ends_with(path) || path.ends_with(source)
    }
}

impl FromStr for ArtifactReference {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (path, name) = match s.rsplit_once(':') {
            Some((path, name)) => {
                let path = path.trim_start_matches("./");
                if path.is_empty() {
                    eyre::bail!("contract path must not be empty in `{s}`");
                }
                (Some(path.to_string()), name)
            }
            None => (None, s),
        };
        if name.is_empty() {
            eyre::bail!("contract name must not be empty");
        }
        Ok(Self { path, name: name.to_string() })
    }
}

impl fmt::Display for ArtifactReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{path}:{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// A deployable contract template read from the build output.
#[derive(Clone, Debug)]
pub struct CompiledTemplate {
    /// The contract name.
    pub name: String,
    /// The source file the contract was compiled from, if known.
    pub source: Option<String>,
    /// Path of the artifact file.
    pub path: PathBuf,
    /// The contract ABI.
    pub abi: JsonAbi,
    /// Creation bytecode, never empty.
    pub bytecode: Bytes,
    /// Runtime bytecode, if present in the artifact.
    pub deployed_bytecode: Option<Bytes>,
    /// Byte ranges of the runtime bytecode holding immutable variables, sorted by offset.
    pub immutable_references: Vec<Range<usize>>,
}

impl CompiledTemplate {
    /// Returns the fully qualified identifier, `<source>:<name>`, or just the name if the source
    /// is unknown.
    pub fn identifier(&self) -> String {
        match &self.source {
            Some(source) => format!("{source}:{}", self.name),
            None => self.name.clone(),
        }
    }

    /// Returns the creation code: the bytecode followed by the ABI encoded constructor arguments.
    pub fn creation_code(&self, args: &[DynSolValue]) -> Result<Bytes, DeployError> {
        match (self.abi.constructor(), args.is_empty()) {
            (None, false) => Err(self.constructor_error(
                "the contract has no constructor but constructor arguments were given",
            )),
            (None, true) => Ok(self.bytecode.clone()),
            (Some(constructor), no_args) => {
                let input = constructor.abi_encode_input(args).map_err(|err| {
                    if no_args {
                        self.constructor_error(format!(
                            "{err}; no arguments provided for contract constructor, consider \
                             --constructor-args or --constructor-args-path"
                        ))
                    } else {
                        self.constructor_error(err)
                    }
                })?;
                Ok(self.bytecode.iter().copied().chain(input).collect())
            }
        }
    }

    /// Parses the given constructor arguments by matching them against the constructor's input
    /// params.
    pub fn parse_constructor_args(&self, args: &[String]) -> Result<Vec<DynSolValue>, DeployError> {
        let Some(constructor) = self.abi.constructor() else {
            if args.is_empty() {
                return Ok(Vec::new());
            }
            return Err(self.constructor_error(
                "the contract has no constructor but constructor arguments were given",
            ));
        };

        let expected = constructor.inputs.len();
        if args.len() != expected {
            return Err(self.constructor_error(format!(
                "expected {expected} arguments, but received {}",
                args.len()
            )));
        }

        constructor
            .inputs
            .iter()
            .zip(args)
            .map(|(input, arg)| {
                let ty = input.resolve().map_err(|err| {
                    self.constructor_error(format!("could not resolve input `{input}`: {err}"))
                })?;
                ty.coerce_str(arg).map_err(|err| {
                    let ty = ty.sol_type_name();
                    self.constructor_error(format!("could not parse `{arg}` as {ty}: {err}"))
                })
            })
            .collect()
    }

    /// Returns `true` if `code` is this contract's runtime bytecode.
    ///
    /// The constructor writes immutable variables into the runtime code, so those ranges are
    /// ignored. Without runtime bytecode in the artifact any code matches.
    pub fn matches_runtime_code(&self, code: &[u8]) -> bool {
        let Some(expected) = &self.deployed_bytecode else { return true };
        if code.len() != expected.len() {
            return false;
        }
        let (mut code, mut expected) = (code.to_vec(), expected.to_vec());
        for range in &self.immutable_references {
            for bytes in [&mut code, &mut expected] {
                if let Some(slot) = bytes.get_mut(range.clone()) {
                    slot.fill(0);
                }
            }
        }
        code == expected
    }

    fn constructor_error(&self, reason: impl fmt::Display) -> DeployError {
        DeployError::ConstructorArgs { contract: self.name.clone(), reason: reason.to_string() }
    }
}

/// Resolves artifact references into deployable templates.
pub trait ArtifactSource {
    /// Resolves `reference` into exactly one template.
    fn resolve(&self, reference: &ArtifactReference) -> Result<CompiledTemplate, DeployError>;
}

impl<T: ArtifactSource + ?Sized> ArtifactSource for &T {
    fn resolve(&self, reference: &ArtifactReference) -> Result<CompiledTemplate, DeployError> {
        (**self).resolve(reference)
    }
}

/// Artifacts of a build output directory.
#[derive(Clone, Debug)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Creates a store reading from the given build output directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the build output directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns every deployable artifact, sorted by identifier.
    ///
    /// Artifacts without creation bytecode (interfaces, abstract contracts) and files that can't
    /// be parsed are skipped.
    pub fn list(&self) -> Result<Vec<CompiledTemplate>, DeployError> {
        self.ensure_exists(None)?;
        let mut templates = self
            .artifact_files()
            .filter_map(|path| {
                let name = path.file_stem()?.to_str()?.to_string();
                match RawArtifact::read(&path).and_then(|raw| raw.into_template(&name)) {
                    Ok(template) => Some(template),
                    Err(err) => {
                        trace!(%err, "skipping artifact");
                        None
                    }
                }
            })
            .collect::<Vec<_>>();
        templates.sort_by_key(|template| template.identifier());
        Ok(templates)
    }

    /// Returns all candidate artifact files, skipping debug files and compiler metadata.
    fn artifact_files(&self) -> impl Iterator<Item = PathBuf> {
        WalkDir::new(&self.root)
            .follow_links(true)
            .into_iter()
            .filter_entry(|entry| {
                !(entry.file_type().is_dir()
                    && entry.file_name().to_str().is_some_and(|name| SKIPPED_DIRS.contains(&name)))
            })
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| {
                path.extension().is_some_and(|ext| ext == "json")
                    && !path.to_string_lossy().ends_with(".dbg.json")
            })
    }

    fn ensure_exists(&self, reference: Option<&ArtifactReference>) -> Result<(), DeployError> {
        if self.root.is_dir() {
            return Ok(());
        }
        Err(DeployError::ArtifactNotFound {
            reference: reference.map_or_else(|| "*".to_string(), ToString::to_string),
            dir: self.root.clone(),
        })
    }
}

impl ArtifactSource for ArtifactStore {
    fn resolve(&self, reference: &ArtifactReference) -> Result<CompiledTemplate, DeployError> {
        self.ensure_exists(Some(reference))?;

        let mut matches = Vec::new();
        for path in self.artifact_files() {
            if path.file_stem().and_then(|stem| stem.to_str()) != Some(reference.name.as_str()) {
                continue;
            }
            let raw = RawArtifact::read(&path)?;
            if reference.matches(&reference.name, raw.source.as_deref()) {
                trace!(path = %path.display(), source = ?raw.source, "found artifact");
                matches.push(raw);
            }
        }

        match matches.len() {
            0 => Err(DeployError::ArtifactNotFound {
                reference: reference.to_string(),
                dir: self.root.clone(),
            }),
            1 => {
                let template = matches.remove(0).into_template(&reference.name)?;
                debug!(
                    contract = %template.identifier(),
                    path = %template.path.display(),
                    "resolved artifact"
                );
                Ok(template)
            }
            _ => {
                let mut candidates = matches
                    .iter()
                    .map(|raw| match &raw.source {
                        Some(source) => format!("{source}:{}", reference.name),
                        None => raw.path.display().to_string(),
                    })
                    .collect::<Vec<_>>();
                candidates.sort();
                Err(DeployError::AmbiguousArtifact { reference: reference.to_string(), candidates })
            }
        }
    }
}

/// An artifact file that has been read but not yet validated.
struct RawArtifact {
    path: PathBuf,
    value: Value,
    source: Option<String>,
}

impl RawArtifact {
    fn read(path: &Path) -> Result<Self, DeployError> {
        let invalid = |reason: String| DeployError::InvalidArtifact {
            path: path.to_path_buf(),
            reason,
        };
        let content = fs::read_to_string(path).map_err(|err| invalid(err.to_string()))?;
        let value: Value = serde_json::from_str(&content).map_err(|err| invalid(err.to_string()))?;
        let source = source_name(path, &value);
        Ok(Self { path: path.to_path_buf(), value, source })
    }

    fn into_template(self, name: &str) -> Result<CompiledTemplate, DeployError> {
        let Self { path, value, source } = self;
        let invalid = |reason: String| DeployError::InvalidArtifact { path: path.clone(), reason };

        let unlinked = unlinked_libraries(&value);
        let immutable_references = immutable_references(&value);
        if !unlinked.is_empty() {
            return Err(invalid(format!(
                "dynamic linking is not supported, deploy the following libraries first and link \
                 them at compile time:\n{}",
                unlinked.join("\n")
            )));
        }

        let object: ContractObject =
            serde_json::from_value(value).map_err(|err| invalid(err.to_string()))?;
        let bytecode = object.bytecode.filter(|code| !code.is_empty()).ok_or_else(|| {
            invalid("no creation bytecode, the contract is abstract or an interface".to_string())
        })?;

        Ok(CompiledTemplate {
            name: name.to_string(),
            source,
            abi: object.abi.unwrap_or_default(),
            bytecode,
            deployed_bytecode: object.deployed_bytecode.filter(|code| !code.is_empty()),
            immutable_references,
            path,
        })
    }
}

/// Returns the source file of an artifact.
///
/// Hardhat records it as `sourceName`, Foundry in the metadata's compilation target. As a last
/// resort the `<File>.sol` directory the artifact is stored in is used.
fn source_name(path: &Path, value: &Value) -> Option<String> {
    if let Some(source) = value.get("sourceName").and_then(Value::as_str) {
        return Some(source.to_string());
    }
    let name = path.file_stem().and_then(|stem| stem.to_str());
    let target = value
        .pointer("/metadata/settings/compilationTarget")
        .and_then(Value::as_object)
        .and_then(|targets| {
            targets.iter().find(|(_, contract)| contract.as_str() == name).map(|(file, _)| file)
        });
    if let Some(file) = target {
        return Some(file.clone());
    }
    path.parent()
        .and_then(|dir| dir.file_name())
        .and_then(|dir| dir.to_str())
        .filter(|dir| dir.ends_with(".sol"))
        .map(str::to_string)
}

/// Returns the library references that still have to be linked, as `\t<Library>: <file>`.
fn unlinked_libraries(value: &Value) -> Vec<String> {
    let refs = value
        .get("linkReferences")
        .or_else(|| value.pointer("/bytecode/linkReferences"))
        .and_then(Value::as_object);
    let Some(refs) = refs else { return Vec::new() };
    refs.iter()
        .flat_map(|(file, libs)| {
            libs.as_object()
                .into_iter()
                .flat_map(move |libs| libs.keys().map(move |lib| format!("\t{lib}: {file}")))
        })
        .collect()
}

/// Returns the runtime bytecode ranges of immutable variables.
///
/// Hardhat stores them as top-level `immutableReferences`, Foundry below `deployedBytecode`. Both
/// map AST ids to lists of `{ "start", "length" }` offsets.
fn immutable_references(value: &Value) -> Vec<Range<usize>> {
    let refs = value
        .get("immutableReferences")
        .or_else(|| value.pointer("/deployedBytecode/immutableReferences"))
        .and_then(Value::as_object);
    let Some(refs) = refs else { return Vec::new() };
    let mut ranges = refs
        .values()
        .filter_map(Value::as_array)
        .flatten()
        .filter_map(|offset| {
            let start = usize::try_from(offset.get("start")?.as_u64()?).ok()?;
            let length = usize::try_from(offset.get("length")?.as_u64()?).ok()?;
            Some(start..start.checked_add(length)?)
        })
        .collect::<Vec<_>>();
    ranges.sort_by_key(|range| range.start);
    ranges
}
