//! Built-in directive handlers.
//!
//! Provides the commonly-used directives out of the box:
//!
//! - Admonitions: note, tip, warning, danger, error, info, example,
//!   success, caution, seealso
//! - Dropdown: collapsible content
//! - Tabs: tab-set and tab-item with a required-parent contract
//! - Code tabs: language-labelled tabbed code blocks
//! - Cards: cards, card, and child-cards grid layouts
//! - Steps: steps and step with injected step numbers
//! - Checklist: styled task lists with progress tracking
//! - Tables: list-table and data-table
//! - Media: figure, audio, gallery
//! - Video: youtube, vimeo, tiktok, and self-hosted video embeds
//! - Embeds: gist, codepen, codesandbox, stackblitz, spotify, soundcloud
//! - Versioning: since, deprecated, changed badges
//! - Includes: include and literalinclude through the host file resolver
//! - Glossary: definition lists from host-supplied data
//! - Inline helpers: button, badge, icon, rubric, target, container
//! - Navigation: breadcrumbs, prev-next, siblings, related
//! - Executable cells: marimo (opaque to the core)

mod admonition;
mod button;
mod cards;
mod cells;
mod checklist;
mod code_tabs;
mod container;
mod data_table;
mod dropdown;
mod embed;
mod glossary;
mod include;
mod inline;
mod media;
mod navigation;
mod steps;
mod tables;
mod tabs;
mod versioning;
mod video;

use std::sync::Arc;

use super::DirectiveHandler;

pub use admonition::{AdmonitionDirective, AdmonitionOptions};
pub use button::ButtonDirective;
pub use cards::{CardDirective, CardsDirective, ChildCardsDirective};
pub use cells::MarimoDirective;
pub use checklist::ChecklistDirective;
pub use code_tabs::CodeTabsDirective;
pub use container::ContainerDirective;
pub use data_table::DataTableDirective;
pub use dropdown::DropdownDirective;
pub use embed::{
    CodePenDirective, CodeSandboxDirective, GistDirective, SoundCloudDirective, SpotifyDirective,
    StackBlitzDirective,
};
pub use glossary::GlossaryDirective;
pub use include::{IncludeDirective, LiteralIncludeDirective};
pub use inline::{BadgeDirective, IconDirective, RubricDirective, TargetDirective};
pub use media::{AudioDirective, FigureDirective, GalleryDirective};
pub use navigation::{
    BreadcrumbsDirective, PrevNextDirective, RelatedDirective, SiblingsDirective,
};
pub use steps::{StepDirective, StepOptions, StepsDirective, StepsOptions};
pub use tables::ListTableDirective;
pub use tabs::{TabItemDirective, TabSetDirective};
pub use versioning::{ChangedDirective, DeprecatedDirective, SinceDirective};
pub use video::{SelfHostedVideoDirective, TikTokDirective, VimeoDirective, YouTubeDirective};

/// Every built-in handler, in registration order.
pub fn all() -> Vec<Arc<dyn DirectiveHandler>> {
    vec![
        Arc::new(AdmonitionDirective),
        Arc::new(DropdownDirective),
        Arc::new(TabSetDirective),
        Arc::new(TabItemDirective),
        Arc::new(CodeTabsDirective),
        Arc::new(CardsDirective),
        Arc::new(CardDirective),
        Arc::new(ChildCardsDirective),
        Arc::new(StepsDirective),
        Arc::new(StepDirective),
        Arc::new(ChecklistDirective),
        Arc::new(ListTableDirective),
        Arc::new(DataTableDirective),
        Arc::new(FigureDirective),
        Arc::new(AudioDirective),
        Arc::new(GalleryDirective),
        Arc::new(YouTubeDirective),
        Arc::new(VimeoDirective),
        Arc::new(TikTokDirective),
        Arc::new(SelfHostedVideoDirective),
        Arc::new(GistDirective),
        Arc::new(CodePenDirective),
        Arc::new(CodeSandboxDirective),
        Arc::new(StackBlitzDirective),
        Arc::new(SpotifyDirective),
        Arc::new(SoundCloudDirective),
        Arc::new(SinceDirective),
        Arc::new(DeprecatedDirective),
        Arc::new(ChangedDirective),
        Arc::new(IncludeDirective),
        Arc::new(LiteralIncludeDirective),
        Arc::new(GlossaryDirective),
        Arc::new(ButtonDirective),
        Arc::new(BadgeDirective),
        Arc::new(IconDirective),
        Arc::new(RubricDirective),
        Arc::new(TargetDirective),
        Arc::new(ContainerDirective),
        Arc::new(BreadcrumbsDirective),
        Arc::new(PrevNextDirective),
        Arc::new(SiblingsDirective),
        Arc::new(RelatedDirective),
        Arc::new(MarimoDirective),
    ]
}
