pub use self::searcher_list::SearcherList;

mod searcher_list;
