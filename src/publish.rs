//! The publish entry point.
//!
//! One run takes the raw doclet dump and a configuration, and performs
//! every side effect: tag application, normalization, navigation, page
//! emission and asset copying. Stages hand their state to the next as
//! plain values; nothing outlives the run.

use crate::assets::{self, TemplateStatic};
use crate::config::{check_encoding, Config};
use crate::docset::{DocSet, Query};
use crate::emit::{EmitOptions, Emitter};
use crate::error::{PublishError, Result};
use crate::link::{LinkRegistry, GLOBAL, INDEX};
use crate::markdown;
use crate::model::{Doclet, Kind};
use crate::nav::{Members, NavBuilder, NavOptions};
use crate::normalize::{self, SourceFile};
use crate::tags::TagRegistry;
use crate::tutorial::TutorialTree;
use crate::view::{self, View, BUNDLED_TEMPLATE};
use std::fs;
use std::path::{Path, PathBuf};

/// A normalized collection, ready to render.
#[derive(Debug)]
pub struct Prepared {
    pub docs: DocSet,
    pub links: LinkRegistry,
    pub sources: Vec<SourceFile>,
    /// Filename claimed for the home page.
    pub index_url: String,
}

/// What a run produced.
#[derive(Debug)]
pub struct Summary {
    pub outdir: PathBuf,
    pub entity_pages: usize,
    pub tutorial_pages: usize,
    pub assets: usize,
}

/// Apply tags, prune and sort, reserve the home and global pages, then run
/// the normalization passes.
pub fn prepare(doclets: Vec<Doclet>, config: &Config) -> Result<Prepared> {
    check_encoding(config.opts.encoding())?;

    let registry = TagRegistry::vuex();
    let mut doclets = doclets;
    let applied: usize = doclets.iter_mut().map(|d| registry.apply_all(d)).sum();
    tracing::info!("applied {} tags to {} doclets", applied, doclets.len());

    let mut docs = DocSet::new(doclets);
    normalize::prepare(&mut docs, config.opts.keep_private());

    let mut links = LinkRegistry::new(registry.namespaces());
    let index_url = links.unique_filename(INDEX);
    let global_url = links.unique_filename(GLOBAL);
    links.register(GLOBAL, &global_url);

    let sources = normalize::normalize(&mut docs, &mut links)?;
    tracing::info!(
        "normalized {} doclets from {} source files",
        docs.len(),
        sources.len()
    );
    Ok(Prepared {
        docs,
        links,
        sources,
        index_url,
    })
}

/// `<dest>/<package>/<version>/` when versioned output is on and the
/// collection carries a named package.
pub fn output_dir(config: &Config, docs: &DocSet) -> PathBuf {
    let dest = config.opts.destination();
    if !config.templates.use_versionning {
        return dest;
    }
    match docs.first(&Query::new().kind(Kind::Package)) {
        Some(package) if !package.name.is_empty() => {
            let dir = dest.join(&package.name);
            match package.version {
                Some(ref version) => dir.join(version),
                None => dir,
            }
        }
        _ => dest,
    }
}

fn load_view(config: &Config) -> Result<View> {
    let template_dir = config.opts.template.as_deref();
    let mut view = match template_dir {
        Some(dir) => View::from_dir(dir)?,
        None => View::bundled()?,
    };
    if let Some(ref layout) = config.templates.default.layout_file {
        let path = view::resolve_layout(layout, template_dir)?;
        view.set_layout_file(&path)?;
    }
    Ok(view)
}

fn read_readme(path: &Path) -> Result<String> {
    let text = fs::read_to_string(path).map_err(|e| PublishError::io(path, e))?;
    Ok(markdown::to_html(&text))
}

/// Publish a full site for `doclets`.
pub fn publish(doclets: Vec<Doclet>, config: &Config) -> Result<Summary> {
    let Prepared {
        docs,
        mut links,
        sources,
        index_url,
    } = prepare(doclets, config)?;
    let defaults = &config.templates.default;

    // source listings are linkable before any page renders
    if defaults.output_source_files {
        for source in &sources {
            let url = links.unique_filename(&source.shortened);
            links.register(&source.shortened, &url);
        }
    }

    let tutorials = match config.opts.tutorials {
        Some(ref dir) => TutorialTree::load(dir)?,
        None => TutorialTree::new(),
    };
    for tutorial in tutorials.preorder() {
        links.register_tutorial(&tutorial.name, &tutorial.title);
    }

    let outdir = output_dir(config, &docs);
    fs::create_dir_all(&outdir).map_err(|e| PublishError::io(&outdir, e))?;

    let view = load_view(config)?;
    let template_static = match config.opts.template {
        Some(ref dir) => TemplateStatic::Dir(dir.as_path()),
        None => TemplateStatic::Bundled(&BUNDLED_TEMPLATE),
    };
    let mut asset_count = assets::copy_template_static(template_static, &outdir)?;
    if let Some(ref statics) = defaults.static_files {
        asset_count += assets::copy_user_static(statics, &outdir)?;
    }

    let members = Members::collect(&docs);
    let has_globals = !members.globals.is_empty();
    let nav = NavBuilder::new(
        &docs,
        &links,
        NavOptions {
            use_collapsibles: config.templates.use_collapsibles,
            use_longname_in_nav: defaults.use_longname_in_nav,
        },
    )
    .build(&members, &tutorials);

    let readme = config.opts.readme.as_deref().map(read_readme).transpose()?;

    let mut emitter = Emitter::new(
        &docs,
        &links,
        &view,
        &nav,
        &outdir,
        EmitOptions {
            separate_members: config.templates.separate_members,
            output_source_files: defaults.output_source_files,
            search_index: config.templates.search_index,
            mainpagetitle: config.opts.mainpagetitle.clone(),
        },
    );
    emitter.source_files(&sources)?;
    emitter.global_page(has_globals)?;
    emitter.index_page(&index_url, readme)?;
    let entity_pages = emitter.entity_pages()?;
    let tutorial_pages = emitter.tutorials(&tutorials)?;
    emitter.search_index()?;

    tracing::info!(
        "wrote {} entity pages and {} tutorials to {}",
        entity_pages,
        tutorial_pages,
        outdir.display()
    );
    Ok(Summary {
        outdir,
        entity_pages,
        tutorial_pages,
        assets: asset_count,
    })
}
